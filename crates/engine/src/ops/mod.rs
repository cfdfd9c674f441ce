//! The [`Engine`] service: every operation runs inside one database
//! transaction.
//!
//! Read-only operations check read access to the ledger, mutating ones check
//! write access. A missing ledger is indistinguishable from a ledger the user
//! cannot see; both are [`Forbidden`](crate::EngineError::Forbidden).

use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod bank;
mod bookings;
mod categories;
mod ledgers;
mod matchers;
mod matching;
mod rapport;
mod users;

pub use access::MembershipRole;
pub use ledgers::LedgerMember;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
