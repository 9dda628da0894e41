//! Stream-level decoding behaviour: chunking, garbage, resync and sweep sizing.
use rfexplorer_logger::rfexplorer::{Decoder, Update};
use std::collections::BTreeMap;

const CONFIG_3: &[u8] =
    b"#C2-F:0096000,0000001,-010,-120,0003,0,000,0000015,0002700,0600000,00000,-005,0000\r\n";
const CONFIG_4: &[u8] =
    b"#C2-F:0096000,0000001,-010,-120,0004,0,000,0000015,0002700,0600000,00000,-005,0000\r\n";

fn sweep_frame(body: &[u8]) -> Vec<u8> {
    let mut f = vec![b'$', b'S', body.len() as u8];
    f.extend_from_slice(body);
    f.extend_from_slice(b"\r\n");
    f
}

fn session() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"#Sn0123456789\r\n");
    data.extend_from_slice(b"#C2-M:003,255,01.12B26\r\n");
    data.extend_from_slice(CONFIG_3);
    data.extend_from_slice(&sweep_frame(&[10, 20, 30]));
    data.extend_from_slice(b"#K1\r\n");
    data.extend_from_slice(&sweep_frame(&[40, 50, 60]));
    data.extend_from_slice(&[b'$', b's', 1]);
    data.extend(std::iter::repeat(7u8).take(16));
    data.extend_from_slice(b"\r\n");
    data.extend_from_slice(CONFIG_4);
    data.extend_from_slice(&[b'$', b'z', 0, 4, 1, 2, 3, 4, b'\r', b'\n']);
    data
}

/// Drop timestamps so runs at different instants compare equal.
fn normalize(updates: Vec<Update>) -> Vec<String> {
    updates
        .into_iter()
        .map(|u| match u {
            Update::Sweep(s) => format!("sweep {:?}", s.amplitudes),
            other => format!("{:?}", other),
        })
        .collect()
}

fn decode_in_chunks(data: &[u8], chunk: usize) -> Vec<String> {
    let mut dec = Decoder::new();
    let mut updates = Vec::new();
    for piece in data.chunks(chunk) {
        updates.extend(dec.process(piece));
    }
    assert!(dec.pending().is_empty(), "chunk size {} left bytes", chunk);
    normalize(updates)
}

#[test]
fn chunk_boundaries_do_not_change_records() {
    let data = session();
    let whole = decode_in_chunks(&data, data.len());
    assert_eq!(whole.len(), 8);
    for chunk in [1, 2, 3, 5, 7, 16, 64] {
        assert_eq!(decode_in_chunks(&data, chunk), whole, "chunk size {}", chunk);
    }
}

#[test]
fn uneven_chunks_match_single_chunk() {
    let data = session();
    let whole = decode_in_chunks(&data, data.len());
    let mut dec = Decoder::new();
    let mut updates = Vec::new();
    let mut rest = &data[..];
    let mut step = 1;
    while !rest.is_empty() {
        let n = step.min(rest.len());
        updates.extend(dec.process(&rest[..n]));
        rest = &rest[n..];
        step = step * 3 % 17 + 1;
    }
    assert_eq!(normalize(updates), whole);
}

/// A session whose noise contains bytes that look like the start of frames.
fn lookalike_session() -> Vec<u8> {
    let mut data = CONFIG_3.to_vec();
    // A stray `#` runs to the next line feed and swallows this sweep as text.
    data.push(b'#');
    data.extend_from_slice(&sweep_frame(&[1, 2, 3]));
    data.extend_from_slice(b"#K1\r\n");
    // `$C` takes `$D` and one more byte as its arguments.
    data.extend_from_slice(b"$C$Dxyz");
    data.extend_from_slice(&sweep_frame(&[4, 5, 6]));
    data.extend_from_slice(b"$#Sn42\r\n");
    data.extend_from_slice(CONFIG_4);
    data.extend_from_slice(&sweep_frame(&[7, 8, 9, 10]));
    data
}

#[test]
fn every_split_point_decodes_like_one_chunk() {
    let data = lookalike_session();
    let whole = decode_in_chunks(&data, data.len());
    assert_eq!(whole.len(), 6);
    assert!(whole[0].starts_with("Configuration"));
    assert_eq!(whole[1], format!("{:?}", Update::TrackingStatus(true)));
    let amplitudes: BTreeMap<u64, f64> =
        [(96_000_000, -7.0), (96_001_000, -7.5), (96_002_000, -8.0)].into_iter().collect();
    assert_eq!(whole[2], format!("sweep {:?}", amplitudes));
    assert_eq!(whole[3], format!("{:?}", Update::SerialNumber("42".into())));
    assert!(whole[4].starts_with("Configuration"));
    assert!(whole[5].starts_with("sweep"));

    for split in 0..=data.len() {
        let mut dec = Decoder::new();
        let mut updates = dec.process(&data[..split]);
        updates.extend(dec.process(&data[split..]));
        assert!(dec.pending().is_empty(), "split at {} left bytes", split);
        assert_eq!(normalize(updates), whole, "split at {}", split);
    }
    assert_eq!(decode_in_chunks(&data, 1), whole);
}

#[test]
fn garbage_between_frames_is_skipped() {
    let mut clean = Vec::new();
    clean.extend_from_slice(CONFIG_3);
    clean.extend_from_slice(&sweep_frame(&[1, 2, 3]));
    clean.extend_from_slice(b"#K0\r\n");

    let mut noisy = Vec::new();
    noisy.extend_from_slice(b"\x00\xffboot");
    noisy.extend_from_slice(CONFIG_3);
    noisy.extend_from_slice(b"xyz\r\n");
    noisy.extend_from_slice(&sweep_frame(&[1, 2, 3]));
    noisy.extend_from_slice(&[0x80, 0x81]);
    noisy.extend_from_slice(b"#K0\r\n");

    let mut dec = Decoder::new();
    let noisy_updates = normalize(dec.process(&noisy));
    assert_eq!(noisy_updates, decode_in_chunks(&clean, clean.len()));
    assert_eq!(dec.counters().garbage_bytes, 6 + 5 + 2);
}

#[test]
fn mismatched_sweep_is_dropped_and_next_decodes() {
    let mut dec = Decoder::new();
    dec.process(CONFIG_3);
    let updates = dec.process(&sweep_frame(&[1, 2, 3, 4]));
    assert!(updates.is_empty());
    assert!(dec.state().sweeps.is_empty());

    let updates = dec.process(&sweep_frame(&[5, 6, 7]));
    assert_eq!(updates.len(), 1);
    assert_eq!(dec.state().sweeps.len(), 1);
    assert_eq!(dec.counters().sweeps_discarded, 1);
}

#[test]
fn configuration_then_sweep_end_to_end() {
    let mut dec = Decoder::new();
    let mut data = CONFIG_3.to_vec();
    data.extend_from_slice(&[b'$', b'S', 3, 10, 20, 30, b'\r', b'\n']);
    dec.process(&data);

    let cfg = dec.state().configuration.clone().expect("configuration stored");
    assert_eq!(cfg.sweep_points, 3);
    assert_eq!(cfg.start_freq, 96_000_000);
    assert_eq!(cfg.freq_step, 1_000);

    let sweeps = &dec.state().sweeps;
    assert_eq!(sweeps.len(), 1);
    let entries: Vec<(u64, f64)> = sweeps[0].amplitudes.iter().map(|(f, a)| (*f, *a)).collect();
    let offset = cfg.amp_offset as f64;
    assert_eq!(
        entries,
        vec![
            (cfg.start_freq, offset - 5.0),
            (cfg.start_freq + cfg.freq_step, offset - 10.0),
            (cfg.start_freq + 2 * cfg.freq_step, offset - 15.0),
        ]
    );
}

#[test]
fn partial_sweep_waits_for_rest() {
    let mut dec = Decoder::new();
    dec.process(CONFIG_3);

    let updates = dec.process(&[b'$', b'S', 3]);
    assert!(updates.is_empty());
    assert!(dec.state().sweeps.is_empty());
    assert_eq!(dec.pending(), &[b'$', b'S', 3]);

    let updates = dec.process(&[10, 20, 30, b'\r', b'\n']);
    assert_eq!(updates.len(), 1);
    assert_eq!(dec.state().sweeps.len(), 1);
    assert!(dec.pending().is_empty());
}

#[test]
fn corrupt_body_resyncs_on_following_frame() {
    let mut dec = Decoder::new();
    dec.process(CONFIG_3);
    let mut data = vec![b'$', b'S', 3, 1, 2, 3, b'X', b'X'];
    data.extend_from_slice(&sweep_frame(&[4, 5, 6]));
    let updates = dec.process(&data);
    assert_eq!(updates.len(), 1);
    assert_eq!(dec.counters().unterminated_frames, 1);
    let sweep = &dec.state().sweeps[0];
    assert_eq!(sweep.amplitudes.values().next().copied(), Some(-5.0 - 2.0));
}

#[test]
fn configuration_change_is_reported() {
    let mut dec = Decoder::new();
    dec.process(CONFIG_3);
    let updates = dec.process(CONFIG_4);
    match &updates[..] {
        [Update::Configuration { config, changed }] => {
            assert!(*changed);
            assert_eq!(config.sweep_points, 4);
        }
        other => panic!("unexpected {:?}", other),
    }
}
