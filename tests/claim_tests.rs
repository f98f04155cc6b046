// Integration tests for the lock file protocol
//
// These tests verify that claims are granted once per target, refused
// when the target is finished or locked, and that the lock file goes away
// on release or drop.

mod common;

use anyhow::Result;
use common::Dirs;
use lecture_cutter::{ClaimManager, OutputTarget};
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_claim_creates_empty_lock_file() -> Result<()> {
    let dirs = Dirs::new()?;
    let target = OutputTarget::new("Lecture 1: Intro", dirs.output(), dirs.scratch());

    let claim = ClaimManager::new(true)
        .try_claim(&target)?
        .expect("fresh target should be claimable");

    assert_eq!(claim.path(), target.claim_path);
    assert!(target.claim_path.exists());
    assert_eq!(fs::metadata(&target.claim_path)?.len(), 0);
    assert!(target
        .claim_path
        .to_string_lossy()
        .ends_with("Lecture_1__Intro.mp4.lock"));

    Ok(())
}

#[test]
fn test_claim_refused_while_locked() -> Result<()> {
    let dirs = Dirs::new()?;
    let target = OutputTarget::new("Lecture 2", dirs.output(), dirs.scratch());
    let claims = ClaimManager::new(true);

    let _first = claims.try_claim(&target)?.expect("first claim");
    assert!(claims.try_claim(&target)?.is_none(), "second claim must be refused");

    Ok(())
}

#[test]
fn test_claim_refused_for_operator_lock() -> Result<()> {
    let dirs = Dirs::new()?;
    let target = OutputTarget::new("Do not download", dirs.output(), dirs.scratch());
    fs::write(&target.claim_path, b"")?;

    assert!(ClaimManager::new(true).try_claim(&target)?.is_none());
    // Refusing must not remove the operator's lock
    assert!(target.claim_path.exists());

    Ok(())
}

#[test]
fn test_claim_refused_when_output_exists() -> Result<()> {
    let dirs = Dirs::new()?;
    let target = OutputTarget::new("Finished", dirs.output(), dirs.scratch());
    fs::write(&target.output_path, b"video")?;

    assert!(ClaimManager::new(false).try_claim(&target)?.is_none());
    assert!(!target.claim_path.exists(), "refusal must not create a lock");

    Ok(())
}

#[test]
fn test_jump_cut_output_only_counts_when_enabled() -> Result<()> {
    let dirs = Dirs::new()?;
    let target = OutputTarget::new("Cut already", dirs.output(), dirs.scratch());
    fs::write(&target.jump_cut_path, b"video")?;

    assert!(ClaimManager::new(true).try_claim(&target)?.is_none());

    let claim = ClaimManager::new(false).try_claim(&target)?;
    assert!(claim.is_some(), "without jump cut the _jc file is irrelevant");

    Ok(())
}

#[test]
fn test_release_removes_lock_file() -> Result<()> {
    let dirs = Dirs::new()?;
    let target = OutputTarget::new("Release me", dirs.output(), dirs.scratch());
    let claims = ClaimManager::new(true);

    let claim = claims.try_claim(&target)?.expect("claim");
    claim.release()?;

    assert!(!target.claim_path.exists());
    assert!(claims.try_claim(&target)?.is_some(), "target is claimable again");

    Ok(())
}

#[test]
fn test_drop_removes_lock_file() -> Result<()> {
    let dirs = Dirs::new()?;
    let target = OutputTarget::new("Dropped", dirs.output(), dirs.scratch());

    {
        let _claim = ClaimManager::new(true).try_claim(&target)?.expect("claim");
        assert!(target.claim_path.exists());
    }

    assert!(!target.claim_path.exists());
    Ok(())
}

#[test]
fn test_release_tolerates_missing_lock_file() -> Result<()> {
    let dirs = Dirs::new()?;
    let target = OutputTarget::new("Removed by hand", dirs.output(), dirs.scratch());

    let claim = ClaimManager::new(true).try_claim(&target)?.expect("claim");
    fs::remove_file(&target.claim_path)?;

    assert!(claim.release().is_ok());
    Ok(())
}

#[test]
fn test_claim_in_missing_directory_is_an_error() -> Result<()> {
    let dirs = Dirs::new()?;
    let missing = dirs.output().join("no-such-subject");
    let target = OutputTarget::new("Lecture", &missing, dirs.scratch());

    assert!(ClaimManager::new(true).try_claim(&target).is_err());
    Ok(())
}

#[test]
fn test_concurrent_claims_grant_exactly_one() -> Result<()> {
    let dirs = Dirs::new()?;
    let target = Arc::new(OutputTarget::new("Contested", dirs.output(), dirs.scratch()));
    let workers = 16;
    let barrier = Arc::new(Barrier::new(workers));

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let target = Arc::clone(&target);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Keep the claim alive until the thread result is inspected
                ClaimManager::new(true).try_claim(&target).unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    let granted = results.iter().filter(|c| c.is_some()).count();
    assert_eq!(granted, 1, "exactly one of {} workers may win", workers);

    drop(results);
    assert!(!target.claim_path.exists());

    Ok(())
}
