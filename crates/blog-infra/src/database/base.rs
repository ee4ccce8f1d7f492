use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{DbConn, DbErr, EntityTrait, PrimaryKeyTrait};

use blog_core::error::RepoError;
use blog_core::lookup::Lookup;
use blog_core::ports::BaseRepository;

/// Generic SeaORM repository; concrete repositories are aliases of it.
pub struct SeaBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> SeaBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

/// Map a SeaORM error onto the repository taxonomy.
pub(crate) fn repo_err(err: DbErr) -> RepoError {
    match err {
        DbErr::RecordNotFound(_) => RepoError::NotFound,
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        DbErr::ConnectionAcquire(e) => RepoError::Connection(e.to_string()),
        other => {
            let message = other.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("unique") || lowered.contains("duplicate") {
                RepoError::Constraint(message)
            } else {
                RepoError::Query(message)
            }
        }
    }
}

#[async_trait]
impl<E, T, ID> BaseRepository<T, ID> for SeaBaseRepository<E>
where
    E: EntityTrait,
    E::Model: Sync + Send,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Send + Sync + Into<sea_orm::Value> + Clone + Copy + 'static,
    T: From<E::Model> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: ID) -> Result<Lookup<T>, RepoError> {
        let result = E::find_by_id(id).one(&self.db).await.map_err(repo_err)?;

        Ok(result.map(Into::into).into())
    }

    async fn delete(&self, id: ID) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
