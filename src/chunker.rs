//! Splits line-protocol payloads into datagram-sized chunks.
//!
//! Chunk boundaries only fall right after a `\n`, so a point is never split
//! across two datagrams. Lines are packed greedily; a line longer than the
//! limit travels alone and whole.

/// Default maximum datagram payload, safe for paths crossing the internet.
pub const DEFAULT_PAYLOAD_SIZE: usize = 512;

/// Returns an iterator over the chunks of `payload`, each at most
/// `max_size` bytes unless it holds a single oversize line.
///
/// # Example
/// ```
/// use adbc_influx::chunker::chunks;
///
/// let parts: Vec<&[u8]> = chunks(b"a 1\nb 2\nc 3\n", 8).collect();
/// assert_eq!(parts, vec![&b"a 1\nb 2\n"[..], &b"c 3\n"[..]]);
/// ```
pub fn chunks(payload: &[u8], max_size: usize) -> Chunks<'_> {
    Chunks {
        rest: payload,
        max_size,
    }
}

/// Iterator returned by [`chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a [u8],
    max_size: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let end = split_point(self.rest, self.max_size);
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(head)
    }
}

/// Byte offset where the next chunk of `data` ends.
///
/// The first line is always taken so every call makes progress.
fn split_point(data: &[u8], max_size: usize) -> usize {
    let mut end = 0;
    while end < data.len() {
        let line_end = match data[end..].iter().position(|&b| b == b'\n') {
            Some(pos) => end + pos + 1,
            None => data.len(),
        };
        if end > 0 && line_end > max_size {
            break;
        }
        end = line_end;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(payload: &[u8], max: usize) -> Vec<&[u8]> {
        chunks(payload, max).collect()
    }

    #[test]
    fn test_empty_payload_yields_nothing() {
        assert!(collect(b"", 10).is_empty());
    }

    #[test]
    fn test_payload_under_limit_is_one_chunk() {
        let payload = b"cpu value=1 1\ncpu value=2 2\n";
        assert_eq!(collect(payload, 512), vec![&payload[..]]);
    }

    #[test]
    fn test_greedy_packing_on_line_boundaries() {
        // Each line is 5 bytes including its newline.
        let payload = b"aaaa\nbbbb\ncccc\ndddd\neeee\n";
        let parts = collect(payload, 12);
        assert_eq!(
            parts,
            vec![&b"aaaa\nbbbb\n"[..], &b"cccc\ndddd\n"[..], &b"eeee\n"[..]]
        );
        assert!(parts.iter().all(|c| c.ends_with(b"\n")));
    }

    #[test]
    fn test_exact_fit_stays_together() {
        let payload = b"aaaa\nbbbb\n";
        assert_eq!(collect(payload, 10), vec![&payload[..]]);
    }

    #[test]
    fn test_oversize_line_emitted_alone_and_whole() {
        let payload = b"ab\nthis line is far too long\ncd\n";
        let parts = collect(payload, 6);
        assert_eq!(
            parts,
            vec![&b"ab\n"[..], &b"this line is far too long\n"[..], &b"cd\n"[..]]
        );
    }

    #[test]
    fn test_unterminated_final_line() {
        let payload = b"aaaa\nbbbb\ncc";
        assert_eq!(collect(payload, 10), vec![&b"aaaa\nbbbb\n"[..], &b"cc"[..]]);
        assert_eq!(collect(b"no newline at all", 4), vec![&b"no newline at all"[..]]);
    }

    #[test]
    fn test_zero_limit_sends_line_per_chunk() {
        assert_eq!(collect(b"a\nb\n", 0), vec![&b"a\n"[..], &b"b\n"[..]]);
    }

    #[test]
    fn test_concatenation_reconstructs_payload() {
        let mut payload = Vec::new();
        for i in 0..200 {
            payload.extend_from_slice(format!("m,host=h{} v={}i {}\n", i % 7, i * 31, i).as_bytes());
        }
        for max in [16, 33, 64, 100, 512, 4096] {
            let parts = collect(&payload, max);
            assert_eq!(parts.concat(), payload);
            for part in &parts {
                let lines = part.iter().filter(|&&b| b == b'\n').count();
                assert!(part.len() <= max || lines == 1);
            }
        }
    }

    #[test]
    fn test_rechunking_a_chunk_is_stable() {
        let payload = b"aaaa\nbbbb\ncccc\nthis one is long\ndd\n";
        for max in [5, 9, 11, 20] {
            for part in collect(payload, max) {
                assert_eq!(collect(part, max), vec![part]);
            }
        }
    }
}
