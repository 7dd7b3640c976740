use chip8::{constants::*, prelude::*, rom::parse_hex_image};

fn load(source: &str) -> Chip8Vm {
    let bytecode = parse_hex_image(source).unwrap();
    let mut vm = Chip8Vm::with_seed(7);
    vm.load_builtin_font().unwrap();
    vm.load_bytecode(&bytecode).unwrap();
    vm
}

#[test]
fn test_add_program() {
    let mut vm = load("600A 6105 8014");

    assert_eq!(vm.run_steps(3).unwrap(), Flow::Ok);
    assert_eq!(vm.registers()[0], 0x0F);
    assert_eq!(vm.registers()[1], 0x05);
    assert_eq!(vm.registers()[0xF], 0);
    assert_eq!(vm.pc(), 0x206);
}

/// Draw the glyph for the digit 7 and read it back from a snapshot.
#[test]
fn test_draw_font_glyph() {
    let mut vm = load("6007 F029 6A02 6B03 DAB5");

    assert_eq!(vm.run_steps(5).unwrap(), Flow::Draw);
    assert_eq!(vm.registers()[0xF], 0);

    let frame = vm.take_frame().unwrap();
    let text = frame.to_text('#', '.');
    let rows: Vec<&str> = text.lines().skip(3).take(5).collect();
    assert_eq!(
        rows.iter().map(|row| &row[2..6]).collect::<Vec<_>>(),
        vec!["####", "...#", "..#.", ".#..", ".#.."]
    );
    assert!(vm.take_frame().is_none());
}

/// Every instruction except a stalled key wait moves the program counter forward.
#[test]
fn test_program_counter_advances() {
    let mut vm = load("6001 7001 8010 A300 F11E F233 C0FF 00E0");

    let mut pc = vm.pc();
    for _ in 0..8 {
        vm.step().unwrap();
        assert_eq!(vm.pc(), pc + 2);
        pc = vm.pc();
    }
}

#[test]
fn test_subroutine_counter() {
    // 0x200: CALL 0x208
    // 0x202: CALL 0x208
    // 0x204: JP 0x204
    // 0x206: padding
    // 0x208: ADD V0, 1
    // 0x20A: RET
    let mut vm = load("2208 2208 1204 0000 7001 00EE");

    vm.run_steps(7).unwrap();
    assert_eq!(vm.registers()[0], 2);
    assert_eq!(vm.pc(), 0x204);
    assert_eq!(vm.sp(), 0);
}

#[test]
fn test_stack_overflow_is_reported() {
    let mut vm = load("2200");

    let mut result = Ok(Flow::Ok);
    for _ in 0..=STACK_SIZE {
        result = vm.step();
        if result.is_err() {
            break;
        }
    }

    assert!(matches!(result, Err(Chip8Error::StackOverflow)));
    assert_eq!(vm.sp(), STACK_SIZE);
}

#[test]
fn test_wait_for_key_across_steps() {
    let mut vm = load("F30A 6142");

    for _ in 0..10 {
        assert_eq!(vm.step().unwrap(), Flow::KeyWait);
    }
    assert_eq!(vm.pc(), 0x200);

    vm.set_key(KeyCode::KeyE, true);
    assert_eq!(vm.step().unwrap(), Flow::Ok);
    assert_eq!(vm.registers()[3], 0xE);

    vm.clear_keys();
    assert!(!vm.is_key_pressed(KeyCode::KeyE));
    vm.step().unwrap();
    assert_eq!(vm.registers()[1], 0x42);
}

#[test]
fn test_sound_timer_event() {
    let mut vm = load("6003 F018");
    vm.run_steps(2).unwrap();

    let events: Vec<bool> = (0..5).map(|_| vm.tick_timers()).collect();
    assert_eq!(events, vec![false, false, true, false, false]);
}

#[test]
fn test_frames_cross_threads() {
    let handoff = FrameHandoff::new();
    let producer = handoff.clone();

    let worker = std::thread::spawn(move || {
        let mut vm = load("6000 F029 D005");
        vm.run_steps(3).unwrap();
        if let Some(frame) = vm.take_frame() {
            producer.publish(frame);
        }
    });
    worker.join().unwrap();

    let frame = handoff.take().unwrap();
    assert!(frame.pixel(0, 0));
    assert!(frame.pixel(3, 0));
    assert!(!frame.pixel(1, 1));
}

#[test]
fn test_large_program_rejected() {
    let mut vm = Chip8Vm::new();
    let image = vec![0u8; MEM_SIZE - MEM_START + 1];
    assert!(matches!(
        vm.load_bytecode(&image),
        Err(Chip8Error::LargeProgram)
    ));
}

#[test]
fn test_maze_runs() {
    let mut vm = load(include_str!("../programs/maze.hex"));

    // Maze fills the screen with diagonal lines, then spins on a jump.
    vm.run_steps(10_000).unwrap();
    assert_eq!(vm.pc(), 0x21C);
    assert!(vm.display().iter().any(|px| *px == 1));
}

#[test]
fn test_disassemble_maze() {
    let bytecode = parse_hex_image(include_str!("../programs/maze.hex")).unwrap();
    let listing = Disassembler::new(&bytecode).to_listing().unwrap();
    let lines: Vec<&str> = listing.lines().collect();

    assert_eq!(lines.len(), 19);
    assert_eq!(lines[2], "0204: A222  LD I, 0x222");
    assert_eq!(lines[3], "0206: C201  RND V2, 0x01");
    assert_eq!(lines[6], "020C: D014  DRW V0, V1, 4");
    assert_eq!(lines[14], "021C: 121C  JP 0x21C");
}
