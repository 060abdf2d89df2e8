use std::{
    fs::File,
    io::{BufReader, ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use cir_types::{CaptureRecord, CirBuffer, CirError, CirResult};
use log::warn;

use crate::format::{decode_record_with, encode_header, record_size, sample_count_for_len, CIR_FILE_SUFFIX};

/// Писатель записей CIR фиксированного размера.
pub struct RecordWriter<W: Write> {
    inner: W,
    sample_count: usize,
    records: u64,
}

/// Читатель записей CIR с известным числом выборок.
pub struct RecordReader<R: Read> {
    inner: R,
    sample_count: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(
        inner: W,
        sample_count: usize,
    ) -> Self {
        Self {
            inner,
            sample_count,
            records: 0,
        }
    }

    /// Записывает одну запись: номер кадра, метку времени, выборки.
    ///
    /// Буфер с другим числом выборок отклоняется до записи первого байта.
    /// Оборванная запись: [`CirError::IncompleteRecord`].
    pub fn write(
        &mut self,
        frame_number: i32,
        rx_timestamp: u64,
        cir: &CirBuffer,
    ) -> CirResult<usize> {
        if cir.sample_count() != self.sample_count {
            return Err(CirError::format_violation(format!(
                "buffer holds {} samples, writer is configured for {}",
                cir.sample_count(),
                self.sample_count
            )));
        }

        let expected = record_size(self.sample_count);
        let header = encode_header(frame_number, rx_timestamp);

        let mut written = 0;
        for part in [&header[..], cir.as_bytes()] {
            written += write_counted(&mut self.inner, part, written, expected)?;
        }

        self.inner.flush()?;
        self.records += 1;

        Ok(written)
    }

    /// Сколько записей записано полностью.
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(
        inner: R,
        sample_count: usize,
    ) -> Self {
        Self {
            inner,
            sample_count,
        }
    }

    /// Читает ровно одну запись.
    pub fn read(&mut self) -> CirResult<CaptureRecord> {
        let mut buf = vec![0u8; record_size(self.sample_count)];

        self.inner.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => CirError::format_violation(format!(
                "truncated record, expected {} bytes",
                buf.len()
            )),
            _ => CirError::Io(e),
        })?;

        decode_record_with(&buf, self.sample_count)
    }
}

/// Пишет `data` целиком, считая байты. `already`: сколько байт записи уже
/// ушло раньше, для отчёта об обрыве.
fn write_counted<W: Write>(
    w: &mut W,
    data: &[u8],
    already: usize,
    expected: usize,
) -> CirResult<usize> {
    let mut done = 0;

    while done < data.len() {
        match w.write(&data[done..]) {
            Ok(0) => {
                return Err(CirError::IncompleteRecord {
                    written: already + done,
                    expected,
                })
            }
            Ok(n) => done += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Write failed after {} bytes: {e}", already + done);
                return Err(CirError::IncompleteRecord {
                    written: already + done,
                    expected,
                });
            }
        }
    }

    Ok(done)
}

/// Имя файла записи: `<experiment>_<frame>_cir.bin`.
pub fn capture_file_name(
    experiment: &str,
    frame_number: i32,
) -> PathBuf {
    PathBuf::from(format!("{experiment}_{frame_number}{CIR_FILE_SUFFIX}"))
}

/// Путь файла записи внутри каталога `dir`.
pub fn capture_path(
    dir: &Path,
    experiment: &str,
    frame_number: i32,
) -> PathBuf {
    dir.join(capture_file_name(experiment, frame_number))
}

/// Создаёт (перезаписывает) файл и сохраняет в него одну запись.
///
/// Если файл не открылся, ничего не пишется. Если запись оборвалась,
/// частичный файл удаляется и возвращается [`CirError::IncompleteRecord`].
pub fn save_record(
    path: &Path,
    frame_number: i32,
    rx_timestamp: u64,
    cir: &CirBuffer,
) -> CirResult<usize> {
    let file = File::create(path)?;
    let mut writer = RecordWriter::new(file, cir.sample_count());

    match writer.write(frame_number, rx_timestamp, cir) {
        Ok(n) => Ok(n),
        Err(e) => {
            drop(writer);
            if let Err(rm) = std::fs::remove_file(path) {
                warn!("Could not remove partial record {path:?}: {rm}");
            }
            Err(e)
        }
    }
}

/// Загружает запись, определяя число выборок по размеру файла.
pub fn load_record(path: &Path) -> CirResult<CaptureRecord> {
    let file = File::open(path)?;
    let len = file.metadata()?.len() as usize;
    let sample_count = sample_count_for_len(len)?;

    RecordReader::new(BufReader::new(file), sample_count).read()
}

#[cfg(test)]
mod tests {
    use cir_types::CirSample;
    use tempfile::tempdir;

    use super::*;

    /// Принимает не более `capacity` байт, потом сообщает "диск полон".
    struct ShortWriter {
        data: Vec<u8>,
        capacity: usize,
        fail_with_error: bool,
    }

    impl Write for ShortWriter {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> std::io::Result<usize> {
            let room = self.capacity - self.data.len();
            if room == 0 {
                if self.fail_with_error {
                    return Err(std::io::Error::new(ErrorKind::Other, "No space left on device"));
                }
                return Ok(0);
            }
            let n = room.min(buf.len()).min(7); // короткими порциями
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn ramp(n: usize) -> CirBuffer {
        let samples: Vec<_> = (0..n)
            .map(|i| CirSample::new(i as i16, -(i as i16)))
            .collect();
        CirBuffer::from_samples(&samples)
    }

    #[test]
    fn test_writer_handles_partial_writes() {
        let cir = ramp(16);
        let sink = ShortWriter {
            data: Vec::new(),
            capacity: usize::MAX,
            fail_with_error: false,
        };
        let mut writer = RecordWriter::new(sink, 16);

        let n = writer.write(3, 99, &cir).unwrap();

        assert_eq!(n, record_size(16));
        assert_eq!(writer.records(), 1);
        let sink = writer.into_inner();
        assert_eq!(sink.data.len(), 12 + 64);
        assert_eq!(&sink.data[12..], cir.as_bytes());
    }

    #[test]
    fn test_short_write_is_reported() {
        for fail_with_error in [false, true] {
            let sink = ShortWriter {
                data: Vec::new(),
                capacity: 30,
                fail_with_error,
            };
            let mut writer = RecordWriter::new(sink, 16);

            let err = writer.write(1, 2, &ramp(16)).unwrap_err();

            assert!(matches!(
                err,
                CirError::IncompleteRecord {
                    written: 30,
                    expected: 76
                }
            ));
            assert_eq!(writer.records(), 0);
        }
    }

    #[test]
    fn test_wrong_sample_count_writes_nothing() {
        let mut writer = RecordWriter::new(Vec::new(), 1016);

        assert!(writer.write(1, 2, &ramp(8)).is_err());
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_capture_file_name() {
        assert_eq!(
            capture_file_name("hallway", -3),
            PathBuf::from("hallway_-3_cir.bin")
        );
        assert_eq!(
            capture_path(Path::new("/tmp/run"), "lab", 12),
            PathBuf::from("/tmp/run/lab_12_cir.bin")
        );
    }

    #[test]
    fn test_save_truncates_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x_1_cir.bin");
        std::fs::write(&path, vec![0xFFu8; 10_000]).unwrap();

        save_record(&path, 1, 5, &ramp(4)).unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 12 + 16);
        let rec = load_record(&path).unwrap();
        assert_eq!(rec.frame_number, 1);
        assert_eq!(rec.samples.len(), 4);
    }

    #[test]
    fn test_reader_detects_truncation() {
        let bytes = crate::encode_record(1, 2, &ramp(4));
        let mut reader = RecordReader::new(&bytes[..20], 4);

        assert!(matches!(reader.read(), Err(CirError::FormatViolation(_))));
    }
}
