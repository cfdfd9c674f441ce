use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, users, util};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a username. Users are trusted: there is no password.
    pub async fn new_user(&self, username: &str) -> ResultEngine<String> {
        let username = util::normalize_display(username)
            .filter(|name| !name.contains(' '))
            .ok_or_else(|| {
                EngineError::InvalidName("username must be a single non-empty word".to_string())
            })?;
        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }
            users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
            }
            .insert(&db_tx)
            .await?;
            Ok(username)
        })
    }
}
