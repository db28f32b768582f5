//! Paged account listing as a lazy stream

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::domain::{Account, IdentityProvider, ProviderError, ProviderResult};

/// Page size requested from the identity provider.
pub const LIST_PAGE_SIZE: usize = 1000;

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Every account, one provider page at a time. Each call starts over from
/// the first page; nothing is fetched until the stream is polled.
pub fn account_stream(
    identity: Arc<dyn IdentityProvider>,
) -> BoxStream<'static, ProviderResult<Account>> {
    stream::try_unfold(Cursor::Start, move |cursor| {
        let identity = identity.clone();
        async move {
            let token = match cursor {
                Cursor::Done => return Ok(None),
                Cursor::Start => None,
                Cursor::Next(token) => Some(token),
            };
            let page = identity.list_users(LIST_PAGE_SIZE, token.as_deref()).await?;
            let next = match page.next_page_token {
                Some(token) if !token.is_empty() => Cursor::Next(token),
                _ => Cursor::Done,
            };
            let accounts = stream::iter(page.accounts.into_iter().map(Ok::<Account, ProviderError>));
            Ok::<_, ProviderError>(Some((accounts, next)))
        }
    })
    .try_flatten()
    .boxed()
}

/// Drains the stream, dropping repeated uids.
pub async fn collect_unique(
    mut accounts: BoxStream<'static, ProviderResult<Account>>,
) -> ProviderResult<Vec<Account>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    while let Some(account) = accounts.try_next().await? {
        if seen.insert(account.uid.clone()) {
            unique.push(account);
        }
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::CreateAccountDto;
    use crate::infrastructure::memory::InMemoryIdentityProvider;

    #[tokio::test]
    async fn streams_across_pages() {
        let provider = Arc::new(InMemoryIdentityProvider::with_bcrypt_cost(4));
        for i in 0..(LIST_PAGE_SIZE + 5) {
            provider
                .create_user(&CreateAccountDto {
                    email: format!("user{}@example.com", i),
                    password: "secret1".into(),
                    display_name: None,
                })
                .await
                .unwrap();
        }

        let accounts = collect_unique(account_stream(provider.clone())).await.unwrap();
        assert_eq!(accounts.len(), LIST_PAGE_SIZE + 5);
    }

    #[tokio::test]
    async fn empty_provider_yields_nothing() {
        let provider = Arc::new(InMemoryIdentityProvider::new());
        let accounts = collect_unique(account_stream(provider)).await.unwrap();
        assert!(accounts.is_empty());
    }
}
