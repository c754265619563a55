//! End-to-end propagation scenarios against live node actors

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use kscope_core::{Advertisement, NodeId, ReachSchedule, Source};
use kscope_diffusion::UntrustPolicy;
use kscope_runtime::{DeliverySink, Registry, ScopeConfig};
use parking_lot::Mutex;

use crate::{init_test_tracing, DeliveryRecorder, TrustHierarchy};

fn id(s: &str) -> NodeId {
    NodeId::new(s).unwrap()
}

fn ids(names: &[&str]) -> BTreeSet<NodeId> {
    names.iter().map(|n| id(n)).collect()
}

fn schedule(hops: &[f64]) -> ReachSchedule {
    ReachSchedule::new(hops.to_vec()).unwrap()
}

fn registry_with(config: ScopeConfig) -> (Registry, DeliveryRecorder) {
    init_test_tracing();
    let recorder = DeliveryRecorder::new();
    let registry = Registry::with_sink(config, recorder.clone());
    (registry, recorder)
}

async fn mutual(registry: &Registry, a: &str, b: &str) {
    registry.trust(&id(a), &id(b)).await;
    registry.trust(&id(b), &id(a)).await;
}

/// Advertise and wait for propagation to finish, returning the recipients
async fn broadcast(registry: &Registry, recorder: &DeliveryRecorder, origin: &str, msg: &str) -> BTreeSet<NodeId> {
    registry.settled().await;
    recorder.clear();
    registry.advertise(&id(origin), Bytes::copy_from_slice(msg.as_bytes())).await;
    tokio::time::timeout(Duration::from_secs(30), registry.settled())
        .await
        .expect("propagation should settle");
    recorder.recipients_of(msg.as_bytes())
}

// ============================================================================
// TRUST GATING
// ============================================================================

#[tokio::test]
async fn test_untrusted_edge_is_never_crossed() {
    let (registry, recorder) = registry_with(ScopeConfig::default().with_reach(schedule(&[1.0, 1.0, 1.0])));

    // o <-> b, b -> a, but a does not trust b; a <-> c
    mutual(&registry, "o", "b").await;
    registry.trust(&id("b"), &id("a")).await;
    mutual(&registry, "a", "c").await;

    let recipients = broadcast(&registry, &recorder, "o", "gated").await;

    assert_eq!(recipients, ids(&["b"]));
    assert_eq!(recorder.deliveries_to(&id("a")), 0);
    assert_eq!(recorder.deliveries_to(&id("c")), 0);
}

#[tokio::test]
async fn test_injected_relay_from_untrusted_forwarder_is_dropped() {
    let (registry, recorder) = registry_with(ScopeConfig::default());
    registry.trust(&id("a"), &id("c")).await;

    let forged = Advertisement {
        source: Source::new(id("o"), id("b")),
        degree: 1,
        payload: Bytes::from_static(b"forged"),
    };
    registry.resolve(&id("a")).receive(forged).await;
    registry.settled().await;

    assert!(recorder.is_empty());
    assert!(registry.snapshot(&id("a")).await.unwrap().routes.is_empty());
}

// ============================================================================
// DELIVERY AND HOP CAP
// ============================================================================

#[tokio::test]
async fn test_origin_and_forwarder_not_delivered() {
    let (registry, recorder) = registry_with(ScopeConfig::default().with_reach(schedule(&[1.0, 1.0, 1.0])));

    mutual(&registry, "o", "a").await;
    mutual(&registry, "o", "b").await;
    mutual(&registry, "a", "b").await;

    broadcast(&registry, &recorder, "o", "triangle").await;

    assert_eq!(recorder.deliveries_to(&id("o")), 0);
    // b hears it from o, and again from a, never from itself
    assert_eq!(recorder.deliveries_to(&id("b")), 2);
    assert_eq!(recorder.deliveries_to(&id("a")), 2);
}

#[tokio::test]
async fn test_hop_cap_limits_chain_depth() {
    let (registry, recorder) = registry_with(ScopeConfig::default().with_reach(schedule(&[1.0, 1.0, 1.0])));

    let chain = ["n0", "n1", "n2", "n3", "n4", "n5", "n6"];
    for pair in chain.windows(2) {
        mutual(&registry, pair[0], pair[1]).await;
    }

    let recipients = broadcast(&registry, &recorder, "n0", "deep").await;

    assert_eq!(recipients, ids(&["n1", "n2", "n3"]));
}

#[tokio::test]
async fn test_single_full_hop_reaches_trusted_set_only() {
    let (registry, recorder) = registry_with(ScopeConfig::default().with_reach(schedule(&[1.0])));

    for peer in ["a", "b", "c"] {
        mutual(&registry, "o", peer).await;
    }
    mutual(&registry, "a", "x").await;

    let recipients = broadcast(&registry, &recorder, "o", "one hop").await;

    assert_eq!(recipients, ids(&["a", "b", "c"]));
}

#[tokio::test]
async fn test_second_hop_never_returns_to_origin() {
    let (registry, recorder) = registry_with(ScopeConfig::default().with_reach(schedule(&[1.0, 0.5])));

    for peer in ["a", "b", "c", "d"] {
        mutual(&registry, "o", peer).await;
    }

    let recipients = broadcast(&registry, &recorder, "o", "msg").await;
    assert_eq!(recipients, ids(&["a", "b", "c", "d"]));
    assert_eq!(recorder.len(), 4);

    // A peer distinct from the origin makes a second hop possible
    mutual(&registry, "a", "e").await;
    let recipients = broadcast(&registry, &recorder, "o", "msg2").await;
    assert_eq!(recipients, ids(&["a", "b", "c", "d", "e"]));
}

// ============================================================================
// UNTRUST
// ============================================================================

async fn untrust_scenario(policy: UntrustPolicy) -> (Registry, DeliveryRecorder, BTreeSet<NodeId>) {
    let config = ScopeConfig::default()
        .with_reach(schedule(&[1.0, 1.0, 1.0]))
        .with_untrust_policy(policy);
    let (registry, recorder) = registry_with(config);

    mutual(&registry, "o", "f").await;
    mutual(&registry, "f", "a").await;
    mutual(&registry, "a", "z").await;

    let recipients = broadcast(&registry, &recorder, "o", "before").await;
    assert_eq!(recipients, ids(&["f", "a", "z"]));

    let via_f = Source::new(id("o"), id("f"));
    let snapshot = registry.snapshot(&id("a")).await.unwrap();
    assert_eq!(snapshot.routes.get(&via_f), Some(&vec![id("z")]));

    registry.untrust(&id("a"), &id("f")).await;
    let recipients = broadcast(&registry, &recorder, "o", "after").await;
    (registry, recorder, recipients)
}

#[tokio::test]
async fn test_untrust_stops_acceptance_with_stale_route() {
    let (registry, _recorder, recipients) = untrust_scenario(UntrustPolicy::RetainRoutes).await;

    assert_eq!(recipients, ids(&["f"]));

    let snapshot = registry.snapshot(&id("a")).await.unwrap();
    assert!(!snapshot.trusted.contains(&id("f")));
    assert!(snapshot.routes.contains_key(&Source::new(id("o"), id("f"))));
}

#[tokio::test]
async fn test_untrust_with_purge_drops_route() {
    let (registry, _recorder, recipients) = untrust_scenario(UntrustPolicy::PurgeRoutes).await;

    assert_eq!(recipients, ids(&["f"]));

    let snapshot = registry.snapshot(&id("a")).await.unwrap();
    assert!(!snapshot.routes.contains_key(&Source::new(id("o"), id("f"))));
}

// ============================================================================
// STICKY ROUTES
// ============================================================================

#[tokio::test]
async fn test_repeated_broadcast_follows_cached_routes() {
    let config = ScopeConfig::default()
        .with_reach(schedule(&[1.0, 0.2, 0.2]))
        .with_seed(11);
    let (registry, recorder) = registry_with(config);

    for hub in ["a", "b"] {
        mutual(&registry, "o", hub).await;
        for leaf in 0..10 {
            mutual(&registry, hub, &format!("{hub}{leaf}")).await;
        }
    }

    let first = broadcast(&registry, &recorder, "o", "first").await;
    let routes_a = registry.snapshot(&id("a")).await.unwrap().routes;

    for round in 0..5 {
        let again = broadcast(&registry, &recorder, "o", &format!("again {round}")).await;
        assert_eq!(again, first);
    }
    assert_eq!(registry.snapshot(&id("a")).await.unwrap().routes, routes_a);

    // a and b plus ceil(0.2 * 10) leaves each
    assert_eq!(first.len(), 6);
}

#[tokio::test]
async fn test_backpressure_never_drops_ads() {
    let config = ScopeConfig::default()
        .with_reach(schedule(&[1.0]))
        .with_mailbox_depth(1);
    let (registry, recorder) = registry_with(config);

    mutual(&registry, "o", "a").await;
    registry.settled().await;

    for n in 0..50 {
        registry.advertise(&id("o"), format!("burst {n}")).await;
    }
    tokio::time::timeout(Duration::from_secs(30), registry.settled())
        .await
        .expect("burst should drain");

    assert_eq!(recorder.deliveries_to(&id("a")), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_mailboxes_block_advertisers() {
    init_test_tracing();
    let recorder = DeliveryRecorder::new();
    let gate = Arc::new(Mutex::new(()));

    let sink = {
        let recorder = recorder.clone();
        let gate = Arc::clone(&gate);
        move |destination: &NodeId, payload: &Bytes| {
            drop(gate.lock());
            recorder.deliver(destination, payload);
        }
    };
    let config = ScopeConfig::default()
        .with_reach(schedule(&[1.0]))
        .with_mailbox_depth(1);
    let registry = Registry::with_sink(config, sink);

    mutual(&registry, "o", "a").await;
    registry.settled().await;

    let held = gate.lock();
    let completed = Arc::new(AtomicUsize::new(0));
    let mut advertiser = {
        let registry = registry.clone();
        let completed = Arc::clone(&completed);
        tokio::spawn(async move {
            for n in 0..6 {
                registry.advertise(&id("o"), format!("held {n}")).await;
                completed.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    // a stalls in the sink on the first ad; one more fits in a's mailbox,
    // o stalls forwarding the third, and o's mailbox takes the fourth
    let stalled = tokio::time::timeout(Duration::from_millis(200), &mut advertiser).await;
    assert!(stalled.is_err(), "advertise should wait on a full mailbox");
    assert!(completed.load(Ordering::SeqCst) <= 4);
    assert!(recorder.is_empty());

    drop(held);
    tokio::time::timeout(Duration::from_secs(30), advertiser)
        .await
        .expect("advertiser should resume")
        .unwrap();
    tokio::time::timeout(Duration::from_secs(30), registry.settled())
        .await
        .expect("held ads should drain");

    assert_eq!(completed.load(Ordering::SeqCst), 6);
    assert_eq!(recorder.recipients(), ids(&["a"]));
    let payloads: Vec<Bytes> = recorder.deliveries().into_iter().map(|d| d.payload).collect();
    let expected: Vec<Bytes> = (0..6).map(|n| Bytes::from(format!("held {n}"))).collect();
    assert_eq!(payloads, expected);
}

// ============================================================================
// HIERARCHY
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hierarchy_lifecycle() {
    let (registry, recorder) = registry_with(ScopeConfig::default().with_seed(2024));
    let root = "root";

    let base = TrustHierarchy::new(id(root), vec![0..6, 0..4, 0..10, 0..20, 0..1]);
    base.build(&registry).await;

    // Only even level 1 nodes accept from root; each chain then narrows to
    // one peer per hop until the hop cap
    let initial = broadcast(&registry, &recorder, root, "Initial message").await;
    assert_eq!(initial.len(), 12);
    assert_eq!(recorder.len(), 12);
    for l1 in base.root_trusting_children() {
        assert!(initial.contains(&l1));
    }

    let follow_up = broadcast(&registry, &recorder, root, "Follow up message to same recipients").await;
    assert_eq!(follow_up, initial);

    let added = TrustHierarchy::new(id(root), vec![6..7, 4..5, 10..11, 20..21, 1..2]);
    added.build(&registry).await;

    let extended = broadcast(&registry, &recorder, root, "Message after adding trust").await;
    assert_eq!(extended.len(), 16);
    assert!(extended.is_superset(&initial));
    assert!(extended.contains(&id("6")));

    added.tear_down(&registry).await;
    let reduced = broadcast(&registry, &recorder, root, "Message after removing trust").await;
    assert_eq!(reduced.len(), 12);
    assert!(reduced.is_subset(&extended));

    registry.reset_all_routes().await;
    let reset = broadcast(&registry, &recorder, root, "Message after resetting routes").await;
    assert_eq!(reset.len(), 12);
    for l1 in base.root_trusting_children() {
        assert!(reset.contains(&l1));
    }
    assert!(
        reset.difference(&reduced).next().is_some(),
        "rebuilt routes should pick at least one different recipient"
    );
}
