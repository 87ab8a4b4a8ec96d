use crate::boundary::BoundaryPredicate;
use crate::error::Result;
use crate::rabin::poly::RabinPoly;
use crate::rabin::window::RollingWindow;
use crate::sink::ChunkSink;
use crate::source::ByteSource;

/// Pulls the whole source through the chunk pipeline.
///
/// Both Rabin engines are primed with a single 1 byte so that leading zeros
/// contribute to the hash and to the boundary fingerprint; the priming byte
/// belongs to the rolling state, not to any chunk. The final chunk is
/// completed unconditionally at EOF.
pub fn process_chunks<S>(
    source: &mut S,
    boundary: &dyn BoundaryPredicate,
    sink: &mut dyn ChunkSink,
) -> Result<()>
where
    S: ByteSource + ?Sized,
{
    let rp = RabinPoly::new();
    let mut rw = RollingWindow::new();

    let mut hash: u64 = 1;
    let mut fingerprint: u64 = 0;
    rw.slide8(1);

    while let Some(b) = source.next_byte()? {
        sink.process_byte(b)?;
        hash = rp.append8(hash, b);
        fingerprint = rw.slide8(b);

        if boundary.is_boundary(fingerprint, sink.size()) {
            sink.complete_chunk(hash, fingerprint)?;
            hash = 1;
            rw.reset();
            rw.slide8(1);
        }
    }

    sink.complete_chunk(hash, fingerprint)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BitwiseBoundary, SpecifiedBoundary};
    use crate::source::ReaderSource;
    use std::io::Cursor;

    struct CollectSink {
        size: u32,
        chunks: Vec<(u32, u64, u64)>,
    }

    impl CollectSink {
        fn new() -> Self {
            CollectSink {
                size: 0,
                chunks: Vec::new(),
            }
        }
    }

    impl ChunkSink for CollectSink {
        fn process_byte(&mut self, _b: u8) -> Result<()> {
            self.size += 1;
            Ok(())
        }

        fn complete_chunk(&mut self, hash: u64, fingerprint: u64) -> Result<()> {
            self.chunks.push((self.size, hash, fingerprint));
            self.size = 0;
            Ok(())
        }

        fn size(&self) -> u32 {
            self.size
        }
    }

    fn chunk_bytes(data: &[u8], boundary: &dyn BoundaryPredicate) -> Vec<(u32, u64, u64)> {
        let mut src = ReaderSource::new(Cursor::new(data.to_vec()));
        let mut sink = CollectSink::new();
        process_chunks(&mut src, boundary, &mut sink).unwrap();
        sink.chunks
    }

    fn pseudo_random(len: usize, mut seed: u64) -> Vec<u8> {
        // splitmix64 keeps the fixtures reproducible without pulling rand in
        // at the unit level.
        (0..len)
            .map(|_| {
                seed = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
                let mut z = seed;
                z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
                z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
                (z ^ (z >> 31)) as u8
            })
            .collect()
    }

    #[test]
    fn single_byte_input_yields_the_known_chunk() {
        let chunks = chunk_bytes(b"A", &BitwiseBoundary::new(13));
        assert_eq!(chunks, vec![(1, 0x141, 0x141)]);
    }

    #[test]
    fn empty_input_completes_one_empty_chunk() {
        let chunks = chunk_bytes(b"", &BitwiseBoundary::new(13));
        assert_eq!(chunks, vec![(0, 1, 0)]);
    }

    #[test]
    fn fixed_size_mode_cuts_at_exact_multiples() {
        // -f 1024: min == max forces cuts purely by size.
        let boundary = SpecifiedBoundary::new(32, 1024, 1024, 0);
        let data = pseudo_random(10_000, 7);
        let chunks = chunk_bytes(&data, &boundary);
        assert_eq!(chunks.len(), 10);
        assert!(chunks[..9].iter().all(|c| c.0 == 1024));
        assert_eq!(chunks[9].0, 784);
    }

    #[test]
    fn chunking_is_deterministic() {
        let data = pseudo_random(100_000, 42);
        let a = chunk_bytes(&data, &BitwiseBoundary::new(13));
        let b = chunk_bytes(&data, &BitwiseBoundary::new(13));
        assert_eq!(a, b);
        assert!(a.len() > 1, "expected several chunks over 100k of noise");
    }

    #[test]
    fn sizes_respect_the_predicate_bounds() {
        let data = pseudo_random(300_000, 3);
        let boundary = SpecifiedBoundary::new(13, 2048, 65536, 0);
        let chunks = chunk_bytes(&data, &boundary);
        let (last, body) = chunks.split_last().unwrap();
        for c in body {
            assert!(c.0 >= 2048 && c.0 <= 65536, "chunk size {}", c.0);
        }
        assert!(last.0 <= 65536);
        assert_eq!(chunks.iter().map(|c| u64::from(c.0)).sum::<u64>(), 300_000);
    }

    #[test]
    fn boundary_marker_moves_the_cuts() {
        let data = pseudo_random(200_000, 11);
        let zero = chunk_bytes(&data, &SpecifiedBoundary::new(13, 2048, 65536, 0));
        let marked = chunk_bytes(&data, &SpecifiedBoundary::new(13, 2048, 65536, 0x1234));
        assert_ne!(
            zero.iter().map(|c| c.0).collect::<Vec<_>>(),
            marked.iter().map(|c| c.0).collect::<Vec<_>>()
        );
    }

    #[test]
    fn an_insert_only_disturbs_chunks_near_the_edit() {
        let data = pseudo_random(262_144, 9);
        let mut edited = data.clone();
        edited.insert(131_072, 0x5a);
        let boundary = SpecifiedBoundary::new(13, 2048, 65536, 0);

        let before = chunk_bytes(&data, &boundary);
        let after = chunk_bytes(&edited, &boundary);

        // Chunks that end before the edit site are bit-identical.
        let mut consumed = 0u64;
        let mut prefix = 0;
        for c in &before {
            if consumed + u64::from(c.0) > 131_072 {
                break;
            }
            consumed += u64::from(c.0);
            prefix += 1;
        }
        assert!(prefix > 0, "edit site should not be in the first chunk");
        assert_eq!(before[..prefix], after[..prefix]);

        // Boundaries are content-defined, so the streams resynchronize past
        // the edit; the trailing chunks agree again.
        assert_eq!(before.last(), after.last());
    }

    #[test]
    fn identical_halves_chunk_identically() {
        let half = pseudo_random(131_072, 5);
        let mut data = half.clone();
        data.extend_from_slice(&half);
        let boundary = SpecifiedBoundary::new(13, 2048, 65536, 0);

        let whole = chunk_bytes(&data, &boundary);
        let alone = chunk_bytes(&half, &boundary);

        // Every chunk of the first half reappears verbatim in the doubled
        // stream; the window resets at each cut, so the second half can only
        // diverge around the seam.
        let first_half: Vec<_> = alone[..alone.len() - 1].to_vec();
        assert_eq!(whole[..first_half.len()], first_half[..]);
    }
}
