use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8::{prelude::*, rom::parse_hex_image};

fn criterion_benchmark(c: &mut Criterion) {
    {
        let bytecode = parse_hex_image(include_str!("../programs/maze.hex")).unwrap();
        let mut vm = Chip8Vm::with_seed(1);
        vm.load_builtin_font().unwrap();
        vm.load_bytecode(&bytecode).unwrap();

        c.bench_function("maze bytecode", |b| {
            b.iter(|| {
                let step_count = black_box(1000_usize);
                black_box(vm.run_steps(step_count))
            })
        });
    }

    {
        // Tight loop of arithmetic, ending in a jump back to the start.
        let bytecode = parse_hex_image("6001 6102 8014 8015 8016 F01E 1200").unwrap();
        let mut vm = Chip8Vm::with_seed(1);
        vm.load_bytecode(&bytecode).unwrap();

        c.bench_function("alu loop", |b| {
            b.iter(|| black_box(vm.run_steps(black_box(1000_usize))))
        });
    }

    c.bench_function("decode all words", |b| {
        b.iter(|| {
            for word in 0..=u16::MAX {
                black_box(Opcode::decode(black_box(word)));
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
