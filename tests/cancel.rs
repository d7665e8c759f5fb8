use rwcancel::{RwCancel, is_cancelled, is_would_block};
use std::io::Write;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn pipe() -> (OwnedFd, OwnedFd) {
    let mut fds = [0i32; 2];
    let res = unsafe { libc::pipe(fds.as_mut_ptr()) };
    assert_eq!(res, 0, "pipe() failed");

    unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
}

/// Writes into `socket` until not even one more byte fits.
fn fill(socket: &UnixStream) {
    for size in [4096, 1] {
        let chunk = vec![0u8; size];

        loop {
            match (&*socket).write(&chunk) {
                Ok(_) => continue,
                Err(err) if is_would_block(&err) => break,
                Err(err) => panic!("Failed to fill socket: {err}"),
            }
        }
    }
}

#[test]
fn test_cancel_before_read_skips_descriptor() {
    let (reader, writer) = pipe();
    let channel = RwCancel::from_fd(&reader).expect("Failed to build channel");

    let wrote = unsafe { libc::write(writer.as_raw_fd(), b"hello".as_ptr() as *const _, 5) };
    assert_eq!(wrote, 5);

    channel.cancel().expect("Failed to cancel");
    assert!(channel.is_cancelled());

    let mut buffer = [0u8; 16];
    let err = channel.read(&mut buffer).unwrap_err();
    assert!(is_cancelled(&err));

    // The pending bytes were never consumed.
    let n = unsafe { libc::read(reader.as_raw_fd(), buffer.as_mut_ptr() as *mut _, 16) };
    assert_eq!(n, 5);
    assert_eq!(&buffer[..5], b"hello");
}

#[test]
fn test_cancel_before_write() {
    let (_reader, writer) = pipe();
    let channel = RwCancel::from_fd(&writer).expect("Failed to build channel");

    channel.cancel().expect("Failed to cancel");

    let err = channel.write(b"data").unwrap_err();
    assert!(is_cancelled(&err));
}

#[test]
fn test_cancel_wakes_blocked_read() {
    let (reader, _writer) = pipe();
    let channel = Arc::new(RwCancel::from_fd(&reader).expect("Failed to build channel"));

    let handle = thread::spawn({
        let channel = channel.clone();
        move || {
            let mut buffer = [0u8; 16];
            channel.read(&mut buffer)
        }
    });

    thread::sleep(Duration::from_millis(50));

    let start = Instant::now();
    channel.cancel().expect("Failed to cancel");
    let result = handle.join().expect("Thread panicked");

    assert!(start.elapsed() < Duration::from_millis(200));
    assert!(is_cancelled(&result.unwrap_err()));
}

#[test]
fn test_cancel_wakes_blocked_write() {
    let (local, _peer) = UnixStream::pair().expect("Failed to create socket pair");
    let channel = Arc::new(RwCancel::from_fd(&local).expect("Failed to build channel"));
    fill(&local);

    let handle = thread::spawn({
        let channel = channel.clone();
        move || channel.write(b"more")
    });

    thread::sleep(Duration::from_millis(50));

    let start = Instant::now();
    channel.cancel().expect("Failed to cancel");
    let result = handle.join().expect("Thread panicked");

    assert!(start.elapsed() < Duration::from_millis(200));
    assert!(is_cancelled(&result.unwrap_err()));
}

#[test]
fn test_one_cancel_wakes_reader_and_writer() {
    let (local, _peer) = UnixStream::pair().expect("Failed to create socket pair");
    let channel = Arc::new(RwCancel::from_fd(&local).expect("Failed to build channel"));
    fill(&local);

    let reader = thread::spawn({
        let channel = channel.clone();
        move || {
            let mut buffer = [0u8; 16];
            channel.read(&mut buffer)
        }
    });
    let writer = thread::spawn({
        let channel = channel.clone();
        move || channel.write(b"more")
    });

    thread::sleep(Duration::from_millis(50));
    channel.cancel().expect("Failed to cancel");

    assert!(is_cancelled(&reader.join().expect("Thread panicked").unwrap_err()));
    assert!(is_cancelled(&writer.join().expect("Thread panicked").unwrap_err()));
}

#[test]
fn test_cancel_is_sticky_and_repeatable() {
    let (reader, _writer) = pipe();
    let channel = RwCancel::from_fd(&reader).expect("Failed to build channel");

    channel.cancel().expect("Failed to cancel");
    channel.cancel().expect("Failed to cancel twice");

    let mut buffer = [0u8; 4];
    for _ in 0..3 {
        let err = channel.read(&mut buffer).unwrap_err();
        assert!(is_cancelled(&err));
    }
}

#[test]
fn test_cancel_takes_priority_over_ready_data() {
    let (reader, writer) = pipe();
    let channel = RwCancel::from_fd(&reader).expect("Failed to build channel");

    channel.cancel().expect("Failed to cancel");
    let wrote = unsafe { libc::write(writer.as_raw_fd(), b"x".as_ptr() as *const _, 1) };
    assert_eq!(wrote, 1);

    assert!(!channel.ready_read());
}

#[test]
fn test_ready_probes() {
    let (reader, writer) = pipe();
    let read_side = RwCancel::from_fd(&reader).expect("Failed to build channel");
    let write_side = RwCancel::from_fd(&writer).expect("Failed to build channel");

    assert!(write_side.ready_write());

    let wrote = unsafe { libc::write(writer.as_raw_fd(), b"x".as_ptr() as *const _, 1) };
    assert_eq!(wrote, 1);
    assert!(read_side.ready_read());

    write_side.cancel().expect("Failed to cancel");
    assert!(!write_side.ready_write());
}

#[test]
fn test_std_read_exact_stops_on_cancel() {
    use std::io::Read;

    let (reader, _writer) = pipe();
    let channel = Arc::new(RwCancel::from_fd(&reader).expect("Failed to build channel"));

    let handle = thread::spawn({
        let channel = channel.clone();
        move || {
            let mut buffer = [0u8; 8];
            (&*channel).read_exact(&mut buffer)
        }
    });

    thread::sleep(Duration::from_millis(50));
    channel.cancel().expect("Failed to cancel");

    let err = handle.join().expect("Thread panicked").unwrap_err();
    assert!(is_cancelled(&err));
}
