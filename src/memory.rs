use crate::driver::{CustomInstruction, InstructionLength, QspiDriver};
use crate::error::Error;

enum Opcode {
    /// Write status register 1 (and 2, on parts that take a second byte).
    WriteStatus = 0x01,
    EnableReset = 0x66,
    Reset = 0x99,
}

/// Quad Enable bit of the status register, as written by [`configure`].
const QUAD_ENABLE: u8 = 0x40;

fn instruction(opcode: Opcode, length: InstructionLength) -> CustomInstruction {
    CustomInstruction {
        opcode: opcode as u8,
        length,
        io2_level: true,
        io3_level: true,
        wait_in_progress: true,
        write_enable: true,
    }
}

/// Software reset followed by the switch to quad I/O.
///
/// The reset needs two consecutive instructions, Enable Reset (66h) and
/// Reset (99h). Writing the status register with the Quad Enable bit set
/// then frees IO2/IO3 for data. Any failure aborts the sequence: a device
/// that does not accept its reset is not usable.
pub(crate) fn configure<'d, D>(driver: &mut D) -> Result<(), Error<D::Error>>
where
    D: QspiDriver<'d>,
{
    debug!("Sending reset enable");
    driver
        .custom_instruction(&instruction(Opcode::EnableReset, InstructionLength::B1), None)
        .map_err(Error::Configure)?;

    debug!("Sending reset");
    driver
        .custom_instruction(&instruction(Opcode::Reset, InstructionLength::B1), None)
        .map_err(Error::Configure)?;

    debug!("Switching to quad I/O");
    driver
        .custom_instruction(
            &instruction(Opcode::WriteStatus, InstructionLength::B2),
            Some(&[QUAD_ENABLE]),
        )
        .map_err(Error::Configure)?;

    Ok(())
}
