use tokio::sync::watch;

use super::{Identity, Session};

/// Observable session state owned by one view, passed explicitly to whatever
/// needs it. Dropping a [`SessionSubscription`] unsubscribes it.
#[derive(Debug)]
pub struct SessionContext {
    tx: watch::Sender<Option<Session>>,
}

impl SessionContext {
    pub fn new(initial: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn user(&self) -> Option<Identity> {
        self.tx.borrow().as_ref().map(|s| s.user.clone())
    }

    /// Publishes a sign-in (`Some`) or sign-out (`None`) to every subscriber.
    pub fn set(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Debug)]
pub struct SessionSubscription {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionSubscription {
    /// Waits for the next session change. Returns `None` once the context is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn user(&self) -> Option<Identity> {
        self.rx.borrow().as_ref().map(|s| s.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            access_token: "tok".into(),
            user: Identity {
                id: Uuid::new_v4(),
                email: "ada@example.com".into(),
            },
            expires_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_see_sign_in_and_sign_out() {
        let ctx = SessionContext::default();
        let mut sub = ctx.subscribe();
        assert!(sub.user().is_none());

        let s = session();
        ctx.set(Some(s.clone()));
        assert_eq!(sub.changed().await, Some(Some(s.clone())));
        assert_eq!(ctx.user(), Some(s.user));

        ctx.set(None);
        assert_eq!(sub.changed().await, Some(None));
        assert!(ctx.current().is_none());
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let ctx = SessionContext::default();
        let sub = ctx.subscribe();
        assert_eq!(ctx.subscriber_count(), 1);
        drop(sub);
        assert_eq!(ctx.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn changed_ends_when_context_dropped() {
        let ctx = SessionContext::default();
        let mut sub = ctx.subscribe();
        drop(ctx);
        assert_eq!(sub.changed().await, None);
    }
}
