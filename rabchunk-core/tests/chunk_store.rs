use rabchunk_core::prelude::*;
use rabchunk_core::{RunOptions, run};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

fn store_run(input: &Path, chunk_dir: &Path) {
    run(&RunOptions {
        in_path: input.to_path_buf(),
        chunk_dir: Some(chunk_dir.to_path_buf()),
        ..Default::default()
    })
    .unwrap();
}

fn chunk_names(dir: &Path) -> BTreeSet<String> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn store_is_idempotent_and_complete() {
    let tmp = tempfile::tempdir().unwrap();
    let chunk_dir = tmp.path().join("chunks");
    fs::create_dir(&chunk_dir).unwrap();
    let input = tmp.path().join("input.bin");
    let data = random_bytes(200_000, 21);
    fs::write(&input, &data).unwrap();

    store_run(&input, &chunk_dir);
    let first = chunk_names(&chunk_dir);
    assert!(first.iter().all(|n| n.ends_with(".rabin")));
    assert!(!chunk_dir.join("tempChunk.rabin.tmp").exists());

    // Random chunks are unique, so the store holds the input bytes exactly.
    let total: usize = first
        .iter()
        .map(|n| fs::read(chunk_dir.join(n)).unwrap().len())
        .sum();
    assert_eq!(total, data.len());

    store_run(&input, &chunk_dir);
    let second = chunk_names(&chunk_dir);
    assert_eq!(first, second);
}

#[test]
fn file_names_are_the_rabin_hash_of_their_content() {
    let tmp = tempfile::tempdir().unwrap();
    let chunk_dir = tmp.path().join("chunks");
    fs::create_dir(&chunk_dir).unwrap();
    let input = tmp.path().join("input.bin");
    fs::write(&input, random_bytes(150_000, 22)).unwrap();

    store_run(&input, &chunk_dir);

    let rp = RabinPoly::new();
    let mut checked = 0;
    for name in chunk_names(&chunk_dir) {
        let body = fs::read(chunk_dir.join(&name)).unwrap();
        let mut hash = 1u64;
        for b in &body {
            hash = rp.append8(hash, *b);
        }
        assert_eq!(name, format!("{:016x}.rabin", hash));
        checked += 1;
    }
    assert!(checked > 1);
}
