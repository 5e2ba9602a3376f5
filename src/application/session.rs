use std::sync::Arc;

use super::{AppError, AppResult};
use crate::domain::{require_text, Role, User, UserId};
use crate::ports::ConfigStore;

/// Identity stub: remembers who logged in, never verifies anything.
pub struct Session {
    config_store: Arc<dyn ConfigStore>,
    current_user: tokio::sync::RwLock<Option<User>>,
}

impl Session {
    pub fn new(config_store: Arc<dyn ConfigStore>) -> Self {
        Self {
            config_store,
            current_user: tokio::sync::RwLock::new(None),
        }
    }

    pub async fn initialize(&self) -> AppResult<()> {
        let config = self.config_store.load_config().await?;
        if let Some(user) = &config.current_user {
            tracing::debug!("Restored session for {} ({})", user.name, user.role);
        }
        *self.current_user.write().await = config.current_user;
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current_user.read().await.clone()
    }

    pub async fn require_user(&self) -> AppResult<User> {
        self.current_user().await.ok_or(AppError::NotLoggedIn)
    }

    /// Start a session. Reusing `id` lets a returning user keep their
    /// projects; otherwise a fresh id is issued.
    pub async fn login(
        &self,
        name: &str,
        email: &str,
        role: Role,
        id: Option<UserId>,
    ) -> AppResult<User> {
        require_text("name", name)?;
        require_text("email", email)?;

        let user = User {
            id: id.unwrap_or_else(UserId::generate),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            role,
        };

        let mut config = self.config_store.load_config().await?;
        config.current_user = Some(user.clone());
        self.config_store.save_config(&config).await?;

        *self.current_user.write().await = Some(user.clone());
        tracing::info!("Logged in as {} ({})", user.name, user.role);
        Ok(user)
    }

    pub async fn logout(&self) -> AppResult<Option<User>> {
        let mut config = self.config_store.load_config().await?;
        let previous = config.current_user.take();
        self.config_store.save_config(&config).await?;

        *self.current_user.write().await = None;
        if let Some(user) = &previous {
            tracing::info!("Logged out {}", user.name);
        }
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::config::FileConfigStore;
    use crate::domain::DomainError;
    use tempfile::TempDir;

    fn session_in(dir: &TempDir) -> Session {
        let store = FileConfigStore::with_dirs(dir.path().join("config"), dir.path().join("data"));
        Session::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_login_persists_across_sessions() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir);
        session.initialize().await.unwrap();
        assert!(session.current_user().await.is_none());

        let user = session
            .login(" Ada ", "ada@example.com", Role::Student, None)
            .await
            .unwrap();
        assert_eq!(user.name, "Ada");

        let restored = session_in(&dir);
        restored.initialize().await.unwrap();
        assert_eq!(restored.current_user().await, Some(user));
    }

    #[tokio::test]
    async fn test_login_keeps_supplied_id() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir);

        let user = session
            .login("Grace", "grace@example.com", Role::Teacher, Some("t-42".into()))
            .await
            .unwrap();
        assert_eq!(user.id, UserId::from("t-42"));
        assert!(user.is_teacher());
    }

    #[tokio::test]
    async fn test_login_requires_name_and_email() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir);

        let err = session
            .login("", "ada@example.com", Role::Student, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::MissingField("name"))));

        let err = session.login("Ada", "  ", Role::Student, None).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::MissingField("email"))));
        assert!(session.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_user() {
        let dir = TempDir::new().unwrap();
        let session = session_in(&dir);
        session
            .login("Ada", "ada@example.com", Role::Student, None)
            .await
            .unwrap();

        let previous = session.logout().await.unwrap();
        assert_eq!(previous.map(|u| u.name), Some("Ada".to_string()));
        assert!(matches!(
            session.require_user().await,
            Err(AppError::NotLoggedIn)
        ));

        let restored = session_in(&dir);
        restored.initialize().await.unwrap();
        assert!(restored.current_user().await.is_none());
    }
}
