use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::DatabaseErrorKind;
use diesel::sql_types::{Array, Float8, Text};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{error, info};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Creator, CreatorChanges, Engagement, EngagementKind, Nft, Post, PostChanges, PostUnlock,
    Trade, User, UserChanges,
};
use crate::schema::{creators, engagements, nfts, post_unlocks, posts, trades, users};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

diesel::define_sql_function! {
    #[sql_name = "array_append"]
    fn append_price(history: Array<Float8>, price: Float8) -> Array<Float8>;
}

diesel::define_sql_function! {
    #[sql_name = "array_append"]
    fn append_wallet(wallets: Array<Text>, wallet: Text) -> Array<Text>;
}

type PgPool = Pool<ConnectionManager<PgConnection>>;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Builds the pool, checks connectivity and applies pending migrations.
    pub fn connect(database_url: &str, pool_size: u32) -> StoreResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder().max_size(pool_size).build(manager).map_err(|e| {
            error!("Failed to build database pool: {}", e);
            StoreError::Pool(e)
        })?;

        let mut conn = pool.get()?;
        let test_query: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("1"))
            .get_result(&mut conn)?;
        info!("Database test query result: {}", test_query);

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        info!("Applied {} pending migrations", applied.len());

        Ok(Self { pool })
    }

    fn conn(&self) -> StoreResult<PooledConnection<ConnectionManager<PgConnection>>> {
        Ok(self.pool.get()?)
    }
}

fn insert_error(err: diesel::result::Error, what: &str) -> StoreError {
    match err {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::Conflict(what.to_string())
        }
        other => StoreError::Database(other),
    }
}

impl Store for PgStore {
    fn create_user(&self, user: User) -> StoreResult<User> {
        let conn = &mut self.conn()?;
        diesel::insert_into(users::table)
            .values(&user)
            .get_result(conn)
            .map_err(|e| insert_error(e, "User"))
    }

    fn find_user_by_wallet(&self, wallet: &str) -> StoreResult<Option<User>> {
        let conn = &mut self.conn()?;
        Ok(users::table
            .filter(users::wallet_address.eq(wallet))
            .first::<User>(conn)
            .optional()?)
    }

    fn update_user(&self, wallet: &str, changes: UserChanges) -> StoreResult<Option<User>> {
        let conn = &mut self.conn()?;
        let now = Utc::now().naive_utc();
        Ok(diesel::update(users::table.filter(users::wallet_address.eq(wallet)))
            .set((&changes, users::updated_at.eq(now)))
            .get_result::<User>(conn)
            .optional()?)
    }

    fn create_creator(&self, creator: Creator) -> StoreResult<Creator> {
        let conn = &mut self.conn()?;
        diesel::insert_into(creators::table)
            .values(&creator)
            .get_result(conn)
            .map_err(|e| insert_error(e, "Creator"))
    }

    fn find_creator(&self, id: Uuid) -> StoreResult<Option<Creator>> {
        let conn = &mut self.conn()?;
        Ok(creators::table.find(id).first::<Creator>(conn).optional()?)
    }

    fn find_creator_by_wallet(&self, wallet: &str) -> StoreResult<Option<Creator>> {
        let conn = &mut self.conn()?;
        Ok(creators::table
            .filter(creators::user_wallet_address.eq(wallet))
            .first::<Creator>(conn)
            .optional()?)
    }

    fn list_creators(&self) -> StoreResult<Vec<Creator>> {
        let conn = &mut self.conn()?;
        Ok(creators::table
            .order_by(creators::created_at.asc())
            .load::<Creator>(conn)?)
    }

    fn update_creator(&self, id: Uuid, changes: CreatorChanges) -> StoreResult<Option<Creator>> {
        let conn = &mut self.conn()?;
        let now = Utc::now().naive_utc();
        Ok(diesel::update(creators::table.find(id))
            .set((&changes, creators::updated_at.eq(now)))
            .get_result::<Creator>(conn)
            .optional()?)
    }

    fn create_post(&self, post: Post) -> StoreResult<Post> {
        let conn = &mut self.conn()?;
        Ok(diesel::insert_into(posts::table)
            .values(&post)
            .get_result(conn)?)
    }

    fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let conn = &mut self.conn()?;
        Ok(posts::table.find(id).first::<Post>(conn).optional()?)
    }

    fn list_posts_by_creator(&self, creator_id: Uuid) -> StoreResult<Vec<Post>> {
        let conn = &mut self.conn()?;
        Ok(posts::table
            .filter(posts::creator_id.eq(creator_id))
            .order_by(posts::created_at.desc())
            .load::<Post>(conn)?)
    }

    fn update_post(&self, id: Uuid, changes: PostChanges) -> StoreResult<Option<Post>> {
        let conn = &mut self.conn()?;
        let now = Utc::now().naive_utc();
        Ok(diesel::update(posts::table.find(id))
            .set((&changes, posts::updated_at.eq(now)))
            .get_result::<Post>(conn)
            .optional()?)
    }

    fn grant_post_access(&self, id: Uuid, wallet: &str) -> StoreResult<Option<Post>> {
        let conn = &mut self.conn()?;
        let now = Utc::now().naive_utc();
        // Single conditional statement so concurrent unlocks cannot duplicate a wallet.
        let appended = diesel::update(
            posts::table
                .find(id)
                .filter(diesel::dsl::not(posts::accessible_by.contains(vec![wallet.to_string()]))),
        )
        .set((
            posts::accessible_by.eq(append_wallet(posts::accessible_by, wallet)),
            posts::updated_at.eq(now),
        ))
        .get_result::<Post>(conn)
        .optional()?;

        match appended {
            Some(post) => Ok(Some(post)),
            None => Ok(posts::table.find(id).first::<Post>(conn).optional()?),
        }
    }

    fn record_unlock(&self, unlock: PostUnlock) -> StoreResult<PostUnlock> {
        let conn = &mut self.conn()?;
        diesel::insert_into(post_unlocks::table)
            .values(&unlock)
            .get_result(conn)
            .map_err(|e| insert_error(e, "Payment transaction"))
    }

    fn create_nft(&self, nft: Nft) -> StoreResult<Nft> {
        let conn = &mut self.conn()?;
        Ok(diesel::insert_into(nfts::table).values(&nft).get_result(conn)?)
    }

    fn find_nft(&self, id: Uuid) -> StoreResult<Option<Nft>> {
        let conn = &mut self.conn()?;
        Ok(nfts::table.find(id).first::<Nft>(conn).optional()?)
    }

    fn list_nfts(&self) -> StoreResult<Vec<Nft>> {
        let conn = &mut self.conn()?;
        Ok(nfts::table
            .order_by(nfts::created_at.asc())
            .load::<Nft>(conn)?)
    }

    fn set_nft_price(&self, id: Uuid, price: f64) -> StoreResult<Option<Nft>> {
        let conn = &mut self.conn()?;
        let now = Utc::now().naive_utc();
        Ok(diesel::update(nfts::table.find(id))
            .set((
                nfts::current_price.eq(price),
                nfts::price_history.eq(append_price(nfts::price_history, price)),
                nfts::updated_at.eq(now),
            ))
            .get_result::<Nft>(conn)
            .optional()?)
    }

    fn find_engagement(&self, nft_id: Uuid) -> StoreResult<Option<Engagement>> {
        let conn = &mut self.conn()?;
        Ok(engagements::table
            .find(nft_id)
            .first::<Engagement>(conn)
            .optional()?)
    }

    fn record_engagement(&self, nft_id: Uuid, kind: EngagementKind) -> StoreResult<Engagement> {
        let conn = &mut self.conn()?;
        let now = Utc::now().naive_utc();
        let (views, likes) = match kind {
            EngagementKind::View => (1_i64, 0_i64),
            EngagementKind::Like => (0_i64, 1_i64),
        };
        Ok(diesel::insert_into(engagements::table)
            .values((
                engagements::nft_id.eq(nft_id),
                engagements::views.eq(views),
                engagements::likes.eq(likes),
                engagements::updated_at.eq(now),
            ))
            .on_conflict(engagements::nft_id)
            .do_update()
            .set((
                engagements::views.eq(engagements::views + views),
                engagements::likes.eq(engagements::likes + likes),
                engagements::updated_at.eq(now),
            ))
            .get_result(conn)?)
    }

    fn create_trade(&self, trade: Trade) -> StoreResult<Trade> {
        let conn = &mut self.conn()?;
        Ok(diesel::insert_into(trades::table)
            .values(&trade)
            .get_result(conn)?)
    }

    fn list_trades(&self, nft_id: Uuid) -> StoreResult<Vec<Trade>> {
        let conn = &mut self.conn()?;
        Ok(trades::table
            .filter(trades::nft_id.eq(nft_id))
            .order_by(trades::timestamp.asc())
            .load::<Trade>(conn)?)
    }

    fn count_trades(&self, nft_id: Uuid) -> StoreResult<i64> {
        let conn = &mut self.conn()?;
        Ok(trades::table
            .filter(trades::nft_id.eq(nft_id))
            .count()
            .get_result(conn)?)
    }
}
