//! TAP driving over both transport modes, verified against the exact byte
//! streams handed to the transport.

mod common;

use common::MockTransport;
use ft2232_avr::{ChipModel, Ft2232Avr, Ir, JtagOp, PinRole, TransportMode};

const JTAG_BINDINGS: &[(PinRole, u8)] = &[
    (PinRole::Tck, 0),
    (PinRole::Tdi, 1),
    (PinRole::Tdo, 2),
    (PinRole::Tms, 3),
];

fn mpsse_device(mock: MockTransport) -> Ft2232Avr {
    let _ = env_logger::builder().is_test(true).try_init();
    Ft2232Avr::from_transport(
        Box::new(mock),
        ChipModel::Ft2232h,
        TransportMode::Mpsse,
        "mock",
        JTAG_BINDINGS,
    )
    .unwrap()
}

#[test]
fn mpsse_tap_reset_command_stream() {
    let mock = MockTransport::new();
    let log = mock.log();
    let mut dev = mpsse_device(mock);
    dev.tap_reset().unwrap();

    // One TMS command: five cycles high, one low, TDI held low.
    assert_eq!(log.lock().unwrap().writes, vec![vec![0x4B, 5, 0x1F]]);
}

#[test]
fn mpsse_ir_shift_command_stream() {
    let mock = MockTransport::new();
    let log = mock.log();
    let mut dev = mpsse_device(mock);
    dev.shift_ir(Ir::Idcode).unwrap();

    let writes = log.lock().unwrap().writes.clone();
    assert_eq!(
        writes,
        vec![
            // Run-Test/Idle -> Shift-IR: TMS 1,1,0,0.
            vec![0x4B, 3, 0x03],
            // Three opcode bits, then the last bit with TMS high.
            vec![0x1B, 2, 0x01, 0x4B, 0, 0x01],
            // Update-IR -> Run-Test/Idle: TMS 1,0.
            vec![0x4B, 1, 0x01],
        ]
    );
}

#[test]
fn mpsse_idcode_read_and_bit_reassembly() {
    // 0x0974C03F: three full bytes, seven MSB-aligned remainder bits, one
    // final bit from the TMS exit command.
    let mock =
        MockTransport::new().with_read_data(vec![0x3F, 0xC0, 0x74, 0x09 << 1, 0x00]);
    let log = mock.log();
    let mut dev = mpsse_device(mock);

    assert_eq!(dev.read_idcode().unwrap(), 0x0974_C03F);

    let exchanges = log.lock().unwrap().exchanges.clone();
    assert_eq!(
        exchanges,
        vec![vec![
            0x39, 2, 0, 0x00, 0x00, 0x00, // 3 data bytes, reading
            0x3B, 6, 0x00, // 7 more bits
            0x6B, 0, 0x01, // exit bit, TMS high, still reading
            0x87, // flush the response
        ]]
    );
}

#[test]
fn bitbang_ir_shift_frames() {
    let bindings: &[(PinRole, u8)] = &[
        (PinRole::Tck, 0),
        (PinRole::Tdi, 1),
        (PinRole::Tms, 2),
        (PinRole::Tdo, 3),
    ];
    let mock = MockTransport::new();
    let log = mock.log();
    let mut dev = Ft2232Avr::from_transport(
        Box::new(mock),
        ChipModel::Ft232r,
        TransportMode::Bitbang,
        "mock",
        bindings,
    )
    .unwrap();
    dev.shift_ir(Ir::Idcode).unwrap();

    // Two snapshots per TCK cycle, clock low then clock high; TMS is bit 2,
    // TDI bit 1, TCK bit 0.
    let writes = log.lock().unwrap().writes.clone();
    assert_eq!(
        writes,
        vec![
            // TMS 1,1,0,0 into Shift-IR.
            vec![4, 5, 4, 5, 0, 1, 0, 1],
            // Opcode 0b0001 LSB first, final bit with TMS high.
            vec![2, 3, 0, 1, 0, 1, 4, 5],
            // TMS 1,0 back to Run-Test/Idle.
            vec![4, 5, 0, 1],
        ]
    );
}

#[test]
fn bitbang_dr_read_samples_tdo_on_the_high_clock_frame() {
    let bindings: &[(PinRole, u8)] = &[
        (PinRole::Tck, 0),
        (PinRole::Tdi, 1),
        (PinRole::Tms, 2),
        (PinRole::Tdo, 3),
    ];
    let mock = MockTransport::new().with_read_data(vec![0x00, 0x08, 0x00, 0x00]);
    let log = mock.log();
    let mut dev = Ft2232Avr::from_transport(
        Box::new(mock),
        ChipModel::Ft232r,
        TransportMode::Bitbang,
        "mock",
        bindings,
    )
    .unwrap();

    assert_eq!(dev.read_dr(2).unwrap(), vec![0x01]);
    assert_eq!(
        log.lock().unwrap().exchanges,
        vec![vec![0, 1, 4, 5]],
        "two shift cycles, last one with TMS high"
    );
}

#[test]
fn jtag_execute_sends_instruction_then_command_payload() {
    let mock = MockTransport::new();
    let log = mock.log();
    let mut dev = mpsse_device(mock);
    dev.jtag_execute(JtagOp::EnterProgramming).unwrap();

    let writes = log.lock().unwrap().writes.clone();
    // IR shift (3 transfers) followed by an 8-bit DR shift (3 transfers).
    assert_eq!(writes.len(), 6);
    assert_eq!(writes[1], vec![0x1B, 2, 0x04, 0x4B, 0, 0x01]);
    assert_eq!(writes[4], vec![0x1B, 6, 0x00, 0x4B, 0, 0x01]);
}

#[test]
fn extended_address_latches_only_on_change() {
    let mock = MockTransport::new();
    let mut dev = mpsse_device(mock);

    // Within the directly addressable range the cached byte already
    // matches and no latch is needed.
    assert_eq!(dev.extended_address(0x0000_1000), None);
    assert_eq!(dev.extended_address(0x0002_0000), Some(2));
    assert_eq!(dev.extended_address(0x0002_FFFF), None);
    assert_eq!(dev.extended_address(0x0003_0000), Some(3));
    assert_eq!(dev.extended_address(0x0000_0000), Some(0));
}
