//! Prometheus metrics for the database connection pool

use prometheus::{register_int_gauge_vec, IntGaugeVec};
use sqlx::PgPool;

lazy_static::lazy_static! {
    static ref DB_POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "blog_db_pool_connections",
        "Connections held by the database pool, by state",
        &["service", "state"]
    )
    .expect("failed to register blog_db_pool_connections");
}

pub(crate) fn update_pool_metrics(pool: &PgPool, service: &str) {
    let open = i64::from(pool.size());
    let idle = pool.num_idle() as i64;
    let max = i64::from(pool.options().get_max_connections());

    for (state, value) in [("idle", idle), ("in_use", open - idle), ("max", max)] {
        DB_POOL_CONNECTIONS
            .with_label_values(&[service, state])
            .set(value);
    }
}
