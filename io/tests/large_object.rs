//! Reading files with the large object policy.
use dicom_io::buffer::ByteBuffer;
use dicom_io::{ByteSource, Endianness, FileByteTarget, ReadOption, ReadOptions, StreamByteSource};
use std::io::Write;

/// Writes a small header, a large value and a trailer to a temporary file.
fn sample_file(large_len: usize) -> (tempfile::NamedTempFile, Vec<u8>) {
    let large: Vec<u8> = (0..large_len).map(|i| (i % 251) as u8).collect();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&(large_len as u32).to_le_bytes()).unwrap();
    file.write_all(&large).unwrap();
    file.write_all(&0xCAFE_u16.to_le_bytes()).unwrap();
    file.flush().unwrap();
    (file, large)
}

#[test]
fn large_buffer_is_deferred_until_read() {
    let (file, large) = sample_file(70_000);
    let mut source =
        StreamByteSource::open(file.path(), Endianness::Little, ReadOptions::new()).unwrap();

    let len = source.read_u32().unwrap() as u64;
    let buffer = source.read_buffer(len).unwrap();
    assert!(!buffer.is_memory());
    assert!(matches!(buffer, ByteBuffer::File(_)));
    assert_eq!(buffer.size(), 70_000);
    // the source moved past the deferred value
    assert_eq!(source.position(), 70_004);
    assert_eq!(source.read_u16().unwrap(), 0xCAFE);
    assert!(source.is_eof());

    assert_eq!(&*buffer.get_range(65_536, 4).unwrap(), &large[65_536..65_540]);
    assert_eq!(&*buffer.data().unwrap(), &large[..]);
}

#[test]
fn small_buffer_is_read_into_memory() {
    let (file, large) = sample_file(65_535);
    let mut source =
        StreamByteSource::open(file.path(), Endianness::Little, ReadOptions::new()).unwrap();
    let len = source.read_u32().unwrap() as u64;
    let buffer = source.read_buffer(len).unwrap();
    assert!(buffer.is_memory());
    assert_eq!(&*buffer.data().unwrap(), &large[..]);
}

#[test]
fn threshold_is_inclusive_and_configurable() {
    let (file, _) = sample_file(100);
    let options = ReadOptions::new().large_object_size(100);
    let mut source = StreamByteSource::open(file.path(), Endianness::Little, options).unwrap();
    source.skip(4).unwrap();
    assert!(!source.read_buffer(100).unwrap().is_memory());

    let options = ReadOptions::new()
        .large_object_size(100)
        .read_option(ReadOption::ReadAll);
    let mut source = StreamByteSource::open(file.path(), Endianness::Little, options).unwrap();
    source.skip(4).unwrap();
    assert!(source.read_buffer(100).unwrap().is_memory());
}

#[test]
fn deferred_buffers_read_concurrently() {
    let (file, large) = sample_file(200_000);
    let options = ReadOptions::new().large_object_size(1000);
    let mut source = StreamByteSource::open(file.path(), Endianness::Little, options).unwrap();
    source.skip(4).unwrap();
    let buffers: Vec<_> = (0..4).map(|_| source.read_buffer(50_000).unwrap()).collect();

    std::thread::scope(|s| {
        let handles: Vec<_> = buffers
            .iter()
            .map(|buffer| s.spawn(move || buffer.to_vec().unwrap()))
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let data = handle.join().unwrap();
            assert_eq!(&data[..], &large[i * 50_000..(i + 1) * 50_000]);
        }
    });
}

#[test]
fn write_deferred_buffer_to_another_file() {
    let (file, large) = sample_file(80_000);
    let mut source =
        StreamByteSource::open(file.path(), Endianness::Little, ReadOptions::new()).unwrap();
    let len = source.read_u32().unwrap() as u64;
    let buffer = source.read_buffer(len).unwrap();

    let out = tempfile::NamedTempFile::new().unwrap();
    let mut target = FileByteTarget::create(out.path(), Endianness::Big).unwrap();
    target.write_u32(len as u32).unwrap();
    target.write_buffer(&buffer).unwrap();
    target.flush().unwrap();
    assert_eq!(target.position(), 80_004);
    drop(target);

    let written = std::fs::read(out.path()).unwrap();
    assert_eq!(&written[..4], &80_000_u32.to_be_bytes());
    assert_eq!(&written[4..], &large[..]);
}
