//! Authorize hot-path benchmarks

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use rolegate_authz::{AuthorizeRequest, DecisionEngine, EngineConfig, MemoryStorage, Scope};
use rolegate_core::{
    HierarchyEdgeRecord, PermissionRecord, RolePermissionRecord, RoleRecord, UserRecord,
    UserRoleRecord,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

const USERS: usize = 100;
const DEPTH: usize = 6;

async fn build_storage() -> Arc<MemoryStorage> {
    let storage = MemoryStorage::new();

    // A chain of roles, each inheriting the previous one, with one grant
    // per level
    for level in 0..DEPTH {
        storage
            .insert_role(RoleRecord::new(format!("level{}", level), format!("Level {}", level)))
            .await;
        storage
            .insert_permission(PermissionRecord::new(
                "doc",
                1u64 << level,
                format!("P{}", level),
            ))
            .await;
        storage
            .insert_role_permission(
                RolePermissionRecord::new(format!("level{}", level), "doc", 1u64 << level)
                    .with_scope("ALL"),
            )
            .await;
        if level > 0 {
            storage
                .insert_edge(HierarchyEdgeRecord::new(
                    format!("level{}", level - 1),
                    format!("level{}", level),
                ))
                .await;
        }
    }

    for user in 0..USERS {
        let id = format!("u{}", user);
        storage.insert_user(UserRecord::new(&id)).await;
        storage
            .insert_user_role(UserRoleRecord::new(&id, format!("level{}", DEPTH - 1)))
            .await;
    }

    Arc::new(storage)
}

fn bench_authorize(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let as_of = Utc.timestamp_opt(0, 0).unwrap();

    let cached_engine = runtime.block_on(async {
        DecisionEngine::new(build_storage().await).await.unwrap()
    });
    let request = AuthorizeRequest::new("u0", "doc", "P0", Scope::All, as_of);

    c.bench_function("authorize_cached", |b| {
        b.to_async(&runtime)
            .iter(|| async { cached_engine.authorize(&request).await.unwrap() })
    });

    let uncached_engine = runtime.block_on(async {
        let config = EngineConfig {
            enable_cache: false,
            ..Default::default()
        };
        DecisionEngine::with_config(config, build_storage().await)
            .await
            .unwrap()
    });

    c.bench_function("authorize_uncached", |b| {
        b.to_async(&runtime)
            .iter(|| async { uncached_engine.authorize(&request).await.unwrap() })
    });

    c.bench_function("authorize_denied", |b| {
        let denied = AuthorizeRequest::new("u0", "doc", "P0", Scope::Group, as_of);
        b.to_async(&runtime)
            .iter(|| async { uncached_engine.authorize(&denied).await.unwrap() })
    });
}

criterion_group!(benches, bench_authorize);
criterion_main!(benches);
