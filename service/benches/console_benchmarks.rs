//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Benchmarks for the console buffers and receive path

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::net::SocketAddr;
use telcon_service::{ConsoleServer, RingBuffer, ServerConfig, ServerMode, Transport, TransportError};

/// Transport that accepts and discards everything
struct NullTransport;

impl Transport for NullTransport {
    fn send(&mut self, data: &[u8], _more: bool) -> Result<(), TransportError> {
        black_box(data);
        Ok(())
    }

    fn close(&mut self) {}

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}

fn connected_server(mode: ServerMode) -> ConsoleServer<NullTransport> {
    let config = ServerConfig::default()
        .with_mode(mode)
        .without_banner()
        .with_buffer_capacities(8192, 8192);
    let mut server = ConsoleServer::new(config).unwrap();
    let id = server.accept(NullTransport).unwrap();
    if mode == ServerMode::Telnet {
        server.receive(id, &[255, 251, 3]).unwrap();
    }
    server.poll(id).unwrap();
    server
}

// Benchmark ring buffer push and pop
fn bench_ring_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_buffer");

    for size in [16usize, 256, 1024].iter() {
        let data = vec![0x5Au8; *size];
        let mut dst = vec![0u8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("push_pop", size), size, |b, _| {
            let mut buffer = RingBuffer::with_capacity(2048).unwrap();
            b.iter(|| {
                buffer.push_bytes(black_box(&data), false).unwrap();
                buffer.pop_bytes(&mut dst).unwrap();
            });
        });
    }

    group.bench_function("push_byte_overwrite", |b| {
        let mut buffer = RingBuffer::with_capacity(64).unwrap();
        buffer.push_bytes(&[0u8; 64], false).unwrap();
        b.iter(|| buffer.push_byte(black_box(b'x'), true).unwrap());
    });

    group.finish();
}

// Benchmark the receive path in pass-through
fn bench_receive(c: &mut Criterion) {
    let mut group = c.benchmark_group("receive");
    let data: Vec<u8> = b"show interfaces brief\r\n".repeat(40);
    let mut dst = vec![0u8; data.len()];
    group.throughput(Throughput::Bytes(data.len() as u64));

    for mode in [ServerMode::Raw, ServerMode::Telnet] {
        group.bench_function(BenchmarkId::new("connected", mode), |b| {
            let mut server = connected_server(mode);
            let Some(id) = server.connection_id() else {
                return;
            };
            b.iter(|| {
                server.receive(id, black_box(&data)).unwrap();
                black_box(server.read(&mut dst));
            });
        });
    }

    group.finish();
}

// Benchmark console writes through the outbound buffer
fn bench_write(c: &mut Criterion) {
    let line = b"2026-01-01T00:00:00Z INFO link up on port 3\r\n";
    c.bench_function("console_write", |b| {
        let mut server = connected_server(ServerMode::Raw);
        b.iter(|| black_box(server.write(black_box(line))));
    });
}

criterion_group!(benches, bench_ring_buffer, bench_receive, bench_write);
criterion_main!(benches);
