//! The JTAG opcode table: every logical operation maps to a fixed
//! instruction opcode and, where defined, a data-register opcode.

use ft2232_avr::{encode, Error, Ir, JtagOp, ProgCommand};

const TABLE: [(JtagOp, u8, Option<u8>); 16] = [
    (JtagOp::TargetReset, 12, None),
    (JtagOp::ReadIdcode, 1, None),
    (JtagOp::SampleBoundary, 2, None),
    (JtagOp::ExtestBoundary, 0, None),
    (JtagOp::EnterProgramming, 4, Some(0x00)),
    (JtagOp::PageLoad, 6, None),
    (JtagOp::PageRead, 7, None),
    (JtagOp::Bypass, 15, None),
    (JtagOp::Program(ProgCommand::None), 5, Some(0x00)),
    (JtagOp::Program(ProgCommand::FlashRead), 5, Some(0x02)),
    (JtagOp::Program(ProgCommand::EepromRead), 5, Some(0x03)),
    (JtagOp::Program(ProgCommand::FuseRead), 5, Some(0x04)),
    (JtagOp::Program(ProgCommand::SigcalRead), 5, Some(0x08)),
    (JtagOp::Program(ProgCommand::FlashWrite), 5, Some(0x10)),
    (JtagOp::Program(ProgCommand::EepromWrite), 5, Some(0x11)),
    (JtagOp::Program(ProgCommand::LockWrite), 5, Some(0x20)),
];

#[test]
fn opcode_table_is_exact() {
    for (op, ir, dr) in TABLE {
        let (got_ir, got_dr) = encode(op);
        assert_eq!(got_ir.opcode(), ir, "{op:?}: wrong instruction opcode");
        assert_eq!(got_dr, dr, "{op:?}: wrong data-register opcode");
    }
    // The two write opcodes not in the loop above.
    assert_eq!(
        encode(JtagOp::Program(ProgCommand::FuseWrite)),
        (Ir::ProgCommands, Some(0x40))
    );
}

#[test]
fn encode_is_pure() {
    for (op, _, _) in TABLE {
        assert_eq!(encode(op), encode(op));
    }
}

#[test]
fn flash_write_and_idcode_pairings() {
    let (ir, dr) = encode(JtagOp::Program(ProgCommand::FlashWrite));
    assert_eq!(ir, Ir::ProgCommands);
    assert_eq!(ir.opcode(), 5);
    assert_eq!(dr, Some(0x10));

    let (ir, dr) = encode(JtagOp::ReadIdcode);
    assert_eq!(ir, Ir::Idcode);
    assert_eq!(ir.opcode(), 1);
    assert_eq!(dr, None);
}

#[test]
fn private_instruction_values_are_rejected() {
    for raw in 8..=11u8 {
        match Ir::try_from(raw) {
            Err(Error::UnsupportedOperation { ir }) => assert_eq!(ir, raw),
            other => panic!("IR {raw} must be rejected, got {other:?}"),
        }
    }
}

#[test]
fn unassigned_instruction_values_are_rejected() {
    for raw in [3u8, 13, 14, 16, 0xFF] {
        assert!(
            matches!(Ir::try_from(raw), Err(Error::UnsupportedOperation { .. })),
            "IR {raw}"
        );
    }
}

#[test]
fn defined_instruction_values_round_trip() {
    for ir in [
        Ir::Extest,
        Ir::Idcode,
        Ir::SamplePreload,
        Ir::ProgEnable,
        Ir::ProgCommands,
        Ir::PageLoad,
        Ir::PageRead,
        Ir::AvrReset,
        Ir::Bypass,
    ] {
        assert_eq!(Ir::try_from(ir.opcode()).unwrap(), ir);
        assert!(ir.opcode() < 16, "instruction register is 4 bits");
    }
}
