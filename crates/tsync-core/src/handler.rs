use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth_user::AuthUser;

/// Caller-supplied replacement for the login/logout endpoints.
///
/// Called once per token change with the derived identity (also when the
/// user signed out). The returned future gates `auth_request_completed`; an
/// `Err` fails the cycle.
///
/// Any `Fn(AuthUser) -> impl Future<Output = anyhow::Result<()>>` closure
/// implements this trait.
#[async_trait]
pub trait TokenChangedHandler: Send + Sync {
    async fn token_changed(&self, user: AuthUser) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> TokenChangedHandler for F
where
    F: Fn(AuthUser) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn token_changed(&self, user: AuthUser) -> anyhow::Result<()> {
        (self)(user).await
    }
}

/// Shared, cloneable handle to a [`TokenChangedHandler`].
#[derive(Clone)]
pub struct TokenChangedHandlerRef(Arc<dyn TokenChangedHandler>);

impl TokenChangedHandlerRef {
    pub fn new(handler: impl TokenChangedHandler + 'static) -> Self {
        Self(Arc::new(handler))
    }

    #[must_use]
    pub fn from_arc(handler: Arc<dyn TokenChangedHandler>) -> Self {
        Self(handler)
    }

    /// Invoke the handler.
    ///
    /// # Errors
    ///
    /// Returns the handler's own error unchanged.
    pub async fn call(&self, user: AuthUser) -> anyhow::Result<()> {
        self.0.token_changed(user).await
    }
}

impl fmt::Debug for TokenChangedHandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenChangedHandlerRef(..)")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[tokio::test]
    async fn closures_are_handlers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = TokenChangedHandlerRef::new(move |user: AuthUser| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(user.id);
                anyhow::Ok(())
            }
        });

        handler.call(AuthUser::signed_out(true)).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn handler_errors_pass_through() {
        let handler = TokenChangedHandlerRef::new(|_user: AuthUser| async {
            Err::<(), _>(anyhow::anyhow!("session store offline"))
        });
        let error = handler.call(AuthUser::signed_out(true)).await.unwrap_err();
        assert_eq!(error.to_string(), "session store offline");
    }
}
