use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use shardlog::logger::{EntryBody, MemorySink};
use shardlog::{
    Action, EventLogger, KvService, LogEntry, MetricsCollector, QueueMode, ShardSet,
};

fn service(mode: QueueMode, capacity: usize) -> (Arc<KvService>, MemorySink) {
    let sink = MemorySink::new();
    let metrics = Arc::new(MetricsCollector::new());
    let logger = EventLogger::with_sink(sink.clone(), capacity, mode, metrics.clone())
        .expect("logger should start");
    let service = KvService::new(Arc::new(ShardSet::new(7)), Arc::new(logger), metrics);
    (Arc::new(service), sink)
}

fn entries(sink: &MemorySink) -> Vec<LogEntry> {
    sink.lines()
        .iter()
        .map(|line| LogEntry::parse_line(line).expect("line should parse"))
        .collect()
}

#[test]
fn test_concurrent_put_has_exactly_one_winner() {
    const THREADS: usize = 16;
    let (service, sink) = service(QueueMode::Split, 4);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let service = service.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                service.put("contested", &i.to_string()).is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);

    service.close().unwrap();
    let entries = entries(&sink);
    assert_eq!(entries.len(), THREADS);
    assert_eq!(entries.iter().filter(|e| !e.is_error()).count(), 1);
    assert_eq!(
        entries.iter().filter(|e| e.is_error()).count(),
        THREADS - 1
    );
}

#[test]
fn test_random_workload_keeps_ids_contiguous() {
    const THREADS: usize = 8;
    const OPS: usize = 200;
    let (service, sink) = service(QueueMode::Split, 8);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let service = service.clone();
            thread::spawn(move || {
                let mut rng = thread_rng();
                let mut mine = Vec::new();
                for _ in 0..OPS {
                    let key: String = (&mut rng)
                        .sample_iter(&Alphanumeric)
                        .take(6)
                        .map(char::from)
                        .collect();
                    let key = format!("t{}-{}", t, key);
                    match rng.gen_range(0..3) {
                        0 => {
                            if service.put(&key, "v").is_ok() {
                                mine.push(key);
                            }
                        }
                        1 => {
                            let _ = service.get(&key);
                        }
                        _ => {
                            let _ = service.delete(&key);
                        }
                    }
                }
                mine
            })
        })
        .collect();

    let mut inserted = HashSet::new();
    for handle in handles {
        inserted.extend(handle.join().unwrap());
    }

    let last = service.close().unwrap();
    assert_eq!(last, (THREADS * OPS) as u64);

    let entries = entries(&sink);
    let ids: Vec<u64> = entries.iter().map(|e| e.sequence_id).collect();
    assert_eq!(ids, (1..=last).collect::<Vec<_>>());

    // Every surviving key was journaled by a PUT event
    let journaled: HashSet<String> = entries
        .iter()
        .filter_map(|e| match &e.body {
            EntryBody::Event(event) if event.action == Action::Put => Some(event.key.clone()),
            _ => None,
        })
        .collect();
    for key in &inserted {
        assert!(journaled.contains(key), "missing PUT for {}", key);
    }
    let put_events = entries
        .iter()
        .filter(|e| matches!(&e.body, EntryBody::Event(event) if event.action == Action::Put))
        .count();
    assert_eq!(service.stats().metrics.puts, put_events);
}

#[test]
fn test_merged_mode_preserves_each_producers_order() {
    const THREADS: usize = 4;
    let (service, sink) = service(QueueMode::Merged, 2);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let service = service.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("p{}-{}", t, i);
                    service.put(&key, "v").unwrap();
                    // Duplicate insert journals an error right after the event
                    assert!(service.put(&key, "w").is_err());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    service.close().unwrap();

    let entries = entries(&sink);
    assert_eq!(entries.len(), THREADS * 100);

    for t in 0..THREADS {
        let prefix = format!("p{}-", t);
        let order: Vec<usize> = entries
            .iter()
            .filter_map(|e| match &e.body {
                EntryBody::Event(event) => event.key.strip_prefix(&prefix),
                _ => None,
            })
            .map(|i| i.parse().unwrap())
            .collect();
        assert_eq!(order, (0..50).collect::<Vec<_>>());
    }
}
