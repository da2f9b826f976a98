//! Tokens don't depend on how the bytes were cut into reads and buffers.

mod common;

use common::{Feeder, chunks, init_test_logging, pool, proptest_config};
use micro_scan::error::ScanError;
use micro_scan::scan::{ScanTarget, Scanner};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Request {
    method: String,
    path: String,
    version: String,
    headers: Vec<(String, String)>,
}

impl Request {
    fn encode(&self) -> Vec<u8> {
        let mut out = format!("{} {} {}\r\n", self.method, self.path, self.version);
        for (name, value) in &self.headers {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        out.push_str("\r\n");
        out.into_bytes()
    }
}

fn arb_request() -> impl Strategy<Value = Request> {
    (
        "[A-Z]{1,7}",
        "/[a-z0-9/%.?=&]{0,40}",
        "HTTP/1\\.[01]",
        prop::collection::vec(("[A-Za-z][A-Za-z-]{0,19}", "[a-z0-9./:;=*-][a-z0-9 ./:;=*-]{0,38}[a-z0-9./:;=*-]"), 0..8),
    )
        .prop_map(|(method, path, version, headers)| Request { method, path, version, headers })
}

/// Reads a request back the way a request parser would drive the scanner.
fn parse(feeder: &mut Feeder<'_>) -> Request {
    let method = feeder.scan(&ScanTarget::SPACE).to_string_lossy();
    let path = feeder.scan(&ScanTarget::SPACE).to_string_lossy();
    let version = feeder.scan(&ScanTarget::CR).to_string_lossy();
    assert!(feeder.scan(&ScanTarget::LF).is_empty());

    let mut headers = vec![];
    loop {
        let mut line = feeder.scan(&ScanTarget::LF);
        assert_eq!(line.byte_at(line.len() - 1), Some(b'\r'));
        line.truncate(line.len() - 1);
        if line.is_empty() {
            break;
        }

        let colon = line.iter().position(|b| b == b':').unwrap();
        let mut value = line.split_off(colon + 1);
        line.truncate(colon);
        value.trim();
        headers.push((line.to_string_lossy(), value.to_string_lossy()));

        feeder.scanner.release_drained(&mut feeder.local);
    }

    Request { method, path, version, headers }
}

proptest! {
    #![proptest_config(proptest_config(256))]

    #[test]
    fn tokens_independent_of_splits(
        request in arb_request(),
        capacity in 4usize..64,
        sizes in prop::collection::vec(1usize..32, 1..6),
    ) {
        init_test_logging();
        let input = request.encode();
        let pool = pool(capacity);
        let mut feeder = Feeder::new(&pool, chunks(&input, &sizes));

        let parsed = parse(&mut feeder);
        prop_assert_eq!(&parsed.method, &request.method);
        prop_assert_eq!(&parsed.path, &request.path);
        prop_assert_eq!(&parsed.version, &request.version);
        prop_assert_eq!(&parsed.headers, &request.headers);
        prop_assert!(feeder.is_exhausted());
        prop_assert_eq!(feeder.scanner.buffered(), 0);
    }

    #[test]
    fn peek_agrees_with_scan(
        data in prop::collection::vec(prop_oneof![Just(b':'), 0x21u8..0x7f], 0..96),
        capacity in 4usize..24,
    ) {
        let pool = pool(capacity);
        let mut local = pool.local();
        let mut scanner = Scanner::new();
        scanner.feed(&mut local, &data).unwrap();

        let expected = data.iter().position(|&b| b == b':');
        prop_assert_eq!(scanner.peek_to_target(&ScanTarget::COLON), expected);

        let view = scanner
            .scan_to_target(&ScanTarget::COLON, usize::MAX, |scanned| ScanError::too_long(scanned, usize::MAX))
            .unwrap();
        prop_assert_eq!(view.map(|v| v.len()), expected);
    }
}
