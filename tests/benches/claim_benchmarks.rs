//! # Claim Verification Benchmarks
//!
//! | Group | What | Target |
//! |-------|------|--------|
//! | tokens | generate / parse a 256-bit token | < 10µs |
//! | store | atomic create + consume | < 50µs |
//! | workflow | initiate, and redeem of an unknown token, through the service | < 200µs |

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use claim_verification::{
    generate_token, ClaimStore, ClaimToken, ClaimVerificationApi, ClaimVerificationConfig,
    ClaimVerificationService, ContactEmail, DocumentStore, LogMailer, PendingClaim,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::{Account, AccountId, Listing, ListingId};
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn bench_tokens(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokens");

    group.bench_function("generate", |b| b.iter(|| black_box(generate_token())));

    let raw = generate_token().expose().to_uppercase();
    group.bench_function("parse", |b| {
        b.iter(|| black_box(ClaimToken::parse(black_box(&raw)).is_ok()))
    });

    group.bench_function("fingerprint", |b| {
        let token = generate_token();
        b.iter(|| black_box(token.fingerprint()))
    });

    group.finish();
}

fn bench_store(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("store");
    let email = ContactEmail::parse("owner@shop.example").unwrap();

    for preloaded in [0usize, 1_000, 10_000] {
        let store = DocumentStore::in_memory();
        rt.block_on(async {
            for _ in 0..preloaded {
                let claim = PendingClaim::new(
                    generate_token(),
                    ListingId::new_v4(),
                    AccountId::new_v4(),
                    email.clone(),
                    Utc::now(),
                    chrono::Duration::hours(1),
                )
                .unwrap();
                store.create(claim).await.unwrap();
            }
        });

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("create_consume", preloaded),
            &store,
            |b, store| {
                b.iter(|| {
                    rt.block_on(async {
                        let now = Utc::now();
                        let claim = PendingClaim::new(
                            generate_token(),
                            ListingId::new_v4(),
                            AccountId::new_v4(),
                            email.clone(),
                            now,
                            chrono::Duration::hours(1),
                        )
                        .unwrap();
                        let token = claim.token.clone();
                        store.create(claim).await.unwrap();
                        let consumed = store.consume(&token, now).await.unwrap();
                        store.resolve_commit(consumed.commit.commit_id).await.unwrap();
                    })
                })
            },
        );
    }

    group.finish();
}

fn bench_workflow(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("workflow");
    group.measurement_time(Duration::from_secs(10));

    let store = Arc::new(DocumentStore::in_memory());
    let account = AccountId::new_v4();
    store
        .upsert_account(Account::new(account, "owner@shop.example"))
        .unwrap();
    let mailer = Arc::new(LogMailer::default());
    let service = ClaimVerificationService::new(
        ClaimVerificationConfig::for_testing(),
        store.clone(),
        store.clone(),
        store.clone(),
        mailer,
    );

    group.bench_function("initiate", |b| {
        b.iter(|| {
            let listing = ListingId::new_v4();
            store
                .upsert_listing(Listing::unclaimed(listing, "Bench Listing"))
                .unwrap();
            rt.block_on(service.initiate_claim(listing, account, "owner@shop.example"))
                .unwrap()
        })
    });

    group.bench_function("redeem_unknown", |b| {
        let unknown = generate_token();
        b.iter(|| black_box(rt.block_on(service.redeem(unknown.expose())).is_err()))
    });

    group.finish();
}

criterion_group!(benches, bench_tokens, bench_store, bench_workflow);
criterion_main!(benches);
