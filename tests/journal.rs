use std::fs;

use shardlog::logger::EntryBody;
use shardlog::{Action, Error, KvService, LogEntry, StoreConfig};
use tempfile::tempdir;

fn read_entries(path: &std::path::Path) -> anyhow::Result<Vec<LogEntry>> {
    fs::read_to_string(path)?
        .lines()
        .map(|line| LogEntry::parse_line(line).map_err(anyhow::Error::from))
        .collect()
}

#[test]
fn test_outcomes_reach_the_log_file_in_order() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("logs").join("shardlog.log");
    let config = StoreConfig::new().with_log_path(&path);

    let service = KvService::open(&config)?;
    service.put("a", "1")?;
    assert!(service.put("a", "2").unwrap_err().is_already_exists());
    service.delete("a")?;
    assert!(service.get("a").unwrap_err().is_not_found());
    assert_eq!(service.close()?, 4);

    assert_eq!(
        fs::read_to_string(&path)?,
        "1\tPUT\ta\t1\n\
         2\tkey already exists\tNULL\tNULL\n\
         3\tDELETE\ta\tNULL\n\
         4\tkey not found\tNULL\tNULL\n"
    );

    let entries = read_entries(&path)?;
    match &entries[2].body {
        EntryBody::Event(event) => {
            assert_eq!(event.action, Action::Delete);
            assert_eq!(event.value, None);
        }
        other => panic!("expected DELETE event, got {:?}", other),
    }
    assert!(entries[3].is_error());

    Ok(())
}

#[test]
fn test_reopening_appends_and_restarts_numbering() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("shardlog.log");
    let config = StoreConfig::new().with_log_path(&path);

    let first = KvService::open(&config)?;
    first.put("a", "1")?;
    first.close()?;
    drop(first);

    let second = KvService::open(&config)?;
    second.put("b", "2")?;
    second.close()?;

    let ids: Vec<u64> = read_entries(&path)?.iter().map(|e| e.sequence_id).collect();
    assert_eq!(ids, vec![1, 1]);
    Ok(())
}

#[test]
fn test_second_writer_is_rejected_while_locked() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let config = StoreConfig::new().with_log_path(dir.path().join("shardlog.log"));

    let _holder = KvService::open(&config)?;
    let err = KvService::open(&config).unwrap_err();
    assert!(matches!(err, Error::SinkLocked(_)), "unexpected error: {}", err);
    Ok(())
}

#[test]
fn test_values_with_separators_stay_on_one_line() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("shardlog.log");
    let service = KvService::open(&StoreConfig::new().with_log_path(&path))?;

    service.put("multi\tline", "first\nsecond")?;
    service.close()?;

    let contents = fs::read_to_string(&path)?;
    assert_eq!(contents.lines().count(), 1);

    let entries = read_entries(&path)?;
    match &entries[0].body {
        EntryBody::Event(event) => {
            assert_eq!(event.key, "multi\tline");
            assert_eq!(event.value.as_deref(), Some("first\nsecond"));
        }
        other => panic!("expected PUT event, got {:?}", other),
    }
    Ok(())
}
