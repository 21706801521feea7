//! Grammar cache and store behaviour under shared and concurrent use
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use extcheck::manifest::{ExtensionType, Grammar, GrammarStore};
use extcheck::{GrammarCache, GrammarError};

fn tiny_grammar() -> Arc<Grammar> {
    Arc::new(Grammar::from_json("tiny", r#"{ "nodes": { "extension": { "name": "!" } } }"#).unwrap())
}

#[test]
fn test_loader_runs_once_per_type() {
    let cache = GrammarCache::default();
    let loads = AtomicUsize::new(0);

    for _ in 0..3 {
        let grammar = cache
            .get_or_load(ExtensionType::Module, || {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(Some(tiny_grammar()))
            })
            .unwrap();
        assert!(grammar.is_some());
    }

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(cache.contains(&ExtensionType::Module));
    assert!(!cache.contains(&ExtensionType::Plugin));
}

#[test]
fn test_missing_grammar_is_cached_as_none() {
    let cache = GrammarCache::default();
    assert_eq!(cache.get_or_load(ExtensionType::File, || Ok(None)).unwrap(), None);
    assert_eq!(cache.get(&ExtensionType::File), Some(None));
    assert_eq!(cache.stats().entry_count, 1);
}

#[test]
fn test_failed_load_is_retried() {
    let cache = GrammarCache::default();
    let failure = GrammarError::InvalidDocument {
        name: "dtd_plugin.json".to_string(),
        details: "broken".to_string(),
    };

    let first = cache.get_or_load(ExtensionType::Plugin, || Err(failure.clone()));
    assert_eq!(first, Err(failure));
    assert!(!cache.contains(&ExtensionType::Plugin));

    let second = cache
        .get_or_load(ExtensionType::Plugin, || Ok(Some(tiny_grammar())))
        .unwrap();
    assert!(second.is_some());
}

#[test]
fn test_invalidate_all() {
    let cache = GrammarCache::new(4);
    cache
        .get_or_load(ExtensionType::Module, || Ok(Some(tiny_grammar())))
        .unwrap();
    cache.invalidate_all();
    assert_eq!(cache.stats().entry_count, 0);
}

#[test]
fn test_store_is_shared_across_threads() {
    let store = Arc::new(GrammarStore::bundled());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || store.load(ExtensionType::Component).unwrap().unwrap())
        })
        .collect();

    let grammars: Vec<Arc<Grammar>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for grammar in &grammars[1..] {
        assert!(Arc::ptr_eq(&grammars[0], grammar));
    }
}
