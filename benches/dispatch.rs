use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use tracer_ctrl::ctrl::{
    Dispatcher, Request, RequestHeader, SockoptEntry, SockoptError, SockoptHandler, SockoptId,
    SockoptRegistry, SockoptType,
};

struct Echo;

impl SockoptHandler for Echo {
    fn get(&self, _opt: SockoptId, input: &[u8]) -> Result<Vec<u8>, SockoptError> {
        Ok(input.to_vec())
    }
}

/// Replays a prepared request stream and swallows the replies.
struct Replay {
    input: Cursor<Vec<u8>>,
    output: io::Sink,
}

impl Read for Replay {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for Replay {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn make_dispatcher() -> Dispatcher {
    let registry = Arc::new(SockoptRegistry::new());
    for i in 0..32u32 {
        registry
            .register(SockoptEntry::new(Arc::new(Echo)).with_get(i * 100, i * 100 + 99))
            .expect("disjoint ranges");
    }
    Dispatcher::new(registry)
}

fn make_stream() -> Vec<u8> {
    let mut buf = Vec::new();
    for i in 0..100u32 {
        let req = Request::new(SockoptType::Get, (i * 37) % 3200, vec![0x5a; 64]);
        req.write_to(&mut buf).expect("vec write");
    }
    buf
}

fn bench_dispatch(c: &mut Criterion) {
    let dispatcher = make_dispatcher();
    let header = RequestHeader::new(SockoptType::Get, 3150, 8);
    c.bench_function("dispatch_handle", |b| {
        b.iter(|| dispatcher.handle(&header, &[1; 8]));
    });

    let stream = make_stream();
    c.bench_function("sockopt_ctl_100_requests", |b| {
        b.iter(|| {
            let mut conn = Replay {
                input: Cursor::new(stream.clone()),
                output: io::sink(),
            };
            dispatcher.sockopt_ctl(&mut conn).expect("clean stream")
        });
    });
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
