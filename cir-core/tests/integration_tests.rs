use cir_core::{
    capture_path, load_record, record_size, save_record, AccumulatorReader, AccumulatorSource, RecordReader,
    RecordWriter, ACC_CHUNK, RECORD_HEADER_SIZE,
};
use cir_types::{CirBuffer, CirError, CirResult, CirSample};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tempfile::tempdir;

// ===========================================================================
// Helpers: детерминированные тест-данные
// ===========================================================================

/// Память аккумулятора с произвольным содержимым и лимитом транзакции.
struct Accumulator {
    memory: Vec<u8>,
    max_transfer: usize,
    reads: usize,
}

impl Accumulator {
    fn random(
        len: usize,
        max_transfer: usize,
        rng: &mut StdRng,
    ) -> Self {
        Self {
            memory: (0..len).map(|_| rng.gen()).collect(),
            max_transfer,
            reads: 0,
        }
    }
}

impl AccumulatorSource for Accumulator {
    fn read_accumulator(
        &mut self,
        offset: u16,
        buf: &mut [u8],
    ) -> CirResult<()> {
        let n = buf.len() - 1;
        if n > self.max_transfer {
            return Err(CirError::transport("transfer too large"));
        }
        let off = offset as usize;
        let src = self
            .memory
            .get(off..off + n)
            .ok_or_else(|| CirError::transport("out of range"))?;

        self.reads += 1;
        buf[0] = 0xD5;
        buf[1..].copy_from_slice(src);
        Ok(())
    }
}

/// Детерминированная CIR: пила по real, обратная пила по imag.
fn sawtooth_cir(n: usize) -> CirBuffer {
    let samples: Vec<CirSample> = (0..n)
        .map(|i| {
            let v = ((i % 128) as i16) * 256;
            CirSample::new(v, -v)
        })
        .collect();
    CirBuffer::from_samples(&samples)
}

// ===========================================================================
// Чтение аккумулятора порциями
// ===========================================================================

#[test]
fn test_chunked_read_matches_single_read() {
    let mut rng = StdRng::seed_from_u64(0x00C1_5EED);

    for _ in 0..200 {
        let chunk_limit = rng.gen_range(1..=300);
        let len = rng.gen_range(1..=4_064);
        let start = rng.gen_range(0..=512);

        let mut source = Accumulator::random(start + len + 16, usize::MAX, &mut rng);

        let mut whole = vec![0u8; len];
        AccumulatorReader::new(len)
            .unwrap()
            .read_into(&mut source, start, &mut whole)
            .unwrap();
        assert_eq!(source.reads, 1);

        source.max_transfer = chunk_limit;
        source.reads = 0;

        let mut chunked = vec![0u8; len];
        let summary = AccumulatorReader::new(chunk_limit)
            .unwrap()
            .read_into(&mut source, start, &mut chunked)
            .unwrap();

        assert_eq!(chunked, whole, "len={len} chunk={chunk_limit} start={start}");
        assert_eq!(summary.bytes, len);
        assert_eq!(summary.chunks, len.div_ceil(chunk_limit));
        assert_eq!(source.reads, summary.chunks);
        assert_eq!(summary.end_offset, start + len);
    }
}

#[test]
fn test_full_1016_sample_cir_read_count() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut source = Accumulator::random(4 * 1016, ACC_CHUNK, &mut rng);
    let mut cir = CirBuffer::new(1016).unwrap();

    let summary = AccumulatorReader::default()
        .read_cir(&mut source, 0, &mut cir)
        .unwrap();

    // 4064 = 63 × 64 + 32
    assert_eq!(summary.chunks, 64);
    assert_eq!(summary.last_chunk, 32);
    assert_eq!(summary.end_offset, 4_064);
    assert_eq!(cir.as_bytes(), &source.memory[..]);
}

#[test]
fn test_exact_multiple_has_full_last_chunk() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut source = Accumulator::random(4 * ACC_CHUNK, ACC_CHUNK, &mut rng);
    let mut dest = vec![0u8; 4 * ACC_CHUNK];

    let summary = AccumulatorReader::default()
        .read_into(&mut source, 0, &mut dest)
        .unwrap();

    assert_eq!(summary.chunks, 4);
    assert_eq!(summary.last_chunk, ACC_CHUNK);
}

// ===========================================================================
// Файл записи
// ===========================================================================

#[test]
fn test_record_file_roundtrip() {
    let dir = tempdir().unwrap();
    let cir = sawtooth_cir(1016);
    let path = capture_path(dir.path(), "corridor", 17);

    let written = save_record(&path, 17, 0x12_3456_789A, &cir).unwrap();
    assert_eq!(written, record_size(1016));

    let rec = load_record(&path).unwrap();
    assert_eq!(rec.frame_number, 17);
    assert_eq!(rec.rx_timestamp, 0x12_3456_789A);
    assert_eq!(rec.samples, cir.samples().collect::<Vec<_>>());
}

#[test]
fn test_file_size_is_fixed() {
    let dir = tempdir().unwrap();

    for n in [1, 992, 1016] {
        let path = capture_path(dir.path(), "size", n as i32);
        save_record(&path, 0, 0, &sawtooth_cir(n)).unwrap();

        let len = std::fs::metadata(&path).unwrap().len() as usize;
        assert_eq!(len, RECORD_HEADER_SIZE + 4 * n);
    }
}

#[test]
fn test_extreme_header_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("edge_-1_cir.bin");

    save_record(&path, -1, 0xFF_FFFF_FFFF, &sawtooth_cir(8)).unwrap();

    let raw = std::fs::read(&path).unwrap();
    assert_eq!(&raw[0..4], &(-1i32).to_ne_bytes());
    assert_eq!(&raw[4..12], &0xFF_FFFF_FFFFu64.to_ne_bytes());

    let rec = load_record(&path).unwrap();
    assert_eq!(rec.frame_number, -1);
    assert_eq!(rec.rx_timestamp, 0xFF_FFFF_FFFF);
}

#[test]
fn test_unwritable_path_leaves_no_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("x_1_cir.bin");

    let err = save_record(&path, 1, 1, &sawtooth_cir(4)).unwrap_err();

    assert!(matches!(err, CirError::Io(_)));
    assert!(!path.exists());
}

#[test]
fn test_stream_of_records() {
    let mut writer = RecordWriter::new(Vec::new(), 32);
    for frame in 0..5 {
        writer.write(frame, frame as u64 * 1_000, &sawtooth_cir(32)).unwrap();
    }
    assert_eq!(writer.records(), 5);

    let bytes = writer.into_inner();
    assert_eq!(bytes.len(), 5 * record_size(32));

    let mut reader = RecordReader::new(&bytes[..], 32);
    for frame in 0..5 {
        let rec = reader.read().unwrap();
        assert_eq!(rec.frame_number, frame);
        assert_eq!(rec.rx_timestamp, frame as u64 * 1_000);
    }
    assert!(reader.read().is_err());
}
