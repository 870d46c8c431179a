//! RV32I instruction decoding.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Lui { rd: u8, imm: u32 },
    Auipc { rd: u8, imm: u32 },
    Jal { rd: u8, imm: i32 },
    Jalr { rd: u8, rs1: u8, imm: i32 },
    Beq { rs1: u8, rs2: u8, imm: i32 },
    Bne { rs1: u8, rs2: u8, imm: i32 },
    Blt { rs1: u8, rs2: u8, imm: i32 },
    Bge { rs1: u8, rs2: u8, imm: i32 },
    Bltu { rs1: u8, rs2: u8, imm: i32 },
    Bgeu { rs1: u8, rs2: u8, imm: i32 },
    Lb { rd: u8, rs1: u8, imm: i32 },
    Lh { rd: u8, rs1: u8, imm: i32 },
    Lw { rd: u8, rs1: u8, imm: i32 },
    Lbu { rd: u8, rs1: u8, imm: i32 },
    Lhu { rd: u8, rs1: u8, imm: i32 },
    Sb { rs1: u8, rs2: u8, imm: i32 },
    Sh { rs1: u8, rs2: u8, imm: i32 },
    Sw { rs1: u8, rs2: u8, imm: i32 },
    Addi { rd: u8, rs1: u8, imm: i32 },
    Slti { rd: u8, rs1: u8, imm: i32 },
    Sltiu { rd: u8, rs1: u8, imm: i32 },
    Xori { rd: u8, rs1: u8, imm: i32 },
    Ori { rd: u8, rs1: u8, imm: i32 },
    Andi { rd: u8, rs1: u8, imm: i32 },
    Slli { rd: u8, rs1: u8, shamt: u8 },
    Srli { rd: u8, rs1: u8, shamt: u8 },
    Srai { rd: u8, rs1: u8, shamt: u8 },
    Add { rd: u8, rs1: u8, rs2: u8 },
    Sub { rd: u8, rs1: u8, rs2: u8 },
    Sll { rd: u8, rs1: u8, rs2: u8 },
    Slt { rd: u8, rs1: u8, rs2: u8 },
    Sltu { rd: u8, rs1: u8, rs2: u8 },
    Xor { rd: u8, rs1: u8, rs2: u8 },
    Srl { rd: u8, rs1: u8, rs2: u8 },
    Sra { rd: u8, rs1: u8, rs2: u8 },
    Or { rd: u8, rs1: u8, rs2: u8 },
    And { rd: u8, rs1: u8, rs2: u8 },
    Fence,
    Ecall,
    Ebreak,
    Unknown(u32),
}

fn rd(word: u32) -> u8 {
    ((word >> 7) & 0x1F) as u8
}

fn rs1(word: u32) -> u8 {
    ((word >> 15) & 0x1F) as u8
}

fn rs2(word: u32) -> u8 {
    ((word >> 20) & 0x1F) as u8
}

fn funct3(word: u32) -> u32 {
    (word >> 12) & 0x7
}

fn funct7(word: u32) -> u32 {
    word >> 25
}

// I-type: imm[11:0] = inst[31:20], sign extended.
fn imm_i(word: u32) -> i32 {
    (word as i32) >> 20
}

// S-type: imm[11:5] = inst[31:25], imm[4:0] = inst[11:7].
fn imm_s(word: u32) -> i32 {
    (((word & 0xFE00_0000) as i32) >> 20) | (((word >> 7) & 0x1F) as i32)
}

// B-type: imm[12|10:5] = inst[31:25], imm[4:1|11] = inst[11:7].
fn imm_b(word: u32) -> i32 {
    let imm = (((word >> 31) & 0x1) << 12)
        | (((word >> 7) & 0x1) << 11)
        | (((word >> 25) & 0x3F) << 5)
        | (((word >> 8) & 0xF) << 1);
    ((imm as i32) << 19) >> 19
}

// U-type: imm[31:12] = inst[31:12], already in position.
fn imm_u(word: u32) -> u32 {
    word & 0xFFFF_F000
}

// J-type: imm[20|10:1|11|19:12] = inst[31:12].
fn imm_j(word: u32) -> i32 {
    let imm = (((word >> 31) & 0x1) << 20)
        | (((word >> 12) & 0xFF) << 12)
        | (((word >> 20) & 0x1) << 11)
        | (((word >> 21) & 0x3FF) << 1);
    ((imm as i32) << 11) >> 11
}

/// Decodes one 32-bit RV32I instruction word. Anything outside the base
/// integer set comes back as [`Instruction::Unknown`].
pub fn decode_rv32(word: u32) -> Instruction {
    match word & 0x7F {
        0x37 => Instruction::Lui {
            rd: rd(word),
            imm: imm_u(word),
        },
        0x17 => Instruction::Auipc {
            rd: rd(word),
            imm: imm_u(word),
        },
        0x6F => Instruction::Jal {
            rd: rd(word),
            imm: imm_j(word),
        },
        0x67 if funct3(word) == 0 => Instruction::Jalr {
            rd: rd(word),
            rs1: rs1(word),
            imm: imm_i(word),
        },
        0x63 => {
            let (rs1, rs2, imm) = (rs1(word), rs2(word), imm_b(word));
            match funct3(word) {
                0b000 => Instruction::Beq { rs1, rs2, imm },
                0b001 => Instruction::Bne { rs1, rs2, imm },
                0b100 => Instruction::Blt { rs1, rs2, imm },
                0b101 => Instruction::Bge { rs1, rs2, imm },
                0b110 => Instruction::Bltu { rs1, rs2, imm },
                0b111 => Instruction::Bgeu { rs1, rs2, imm },
                _ => Instruction::Unknown(word),
            }
        }
        0x03 => {
            let (rd, rs1, imm) = (rd(word), rs1(word), imm_i(word));
            match funct3(word) {
                0b000 => Instruction::Lb { rd, rs1, imm },
                0b001 => Instruction::Lh { rd, rs1, imm },
                0b010 => Instruction::Lw { rd, rs1, imm },
                0b100 => Instruction::Lbu { rd, rs1, imm },
                0b101 => Instruction::Lhu { rd, rs1, imm },
                _ => Instruction::Unknown(word),
            }
        }
        0x23 => {
            let (rs1, rs2, imm) = (rs1(word), rs2(word), imm_s(word));
            match funct3(word) {
                0b000 => Instruction::Sb { rs1, rs2, imm },
                0b001 => Instruction::Sh { rs1, rs2, imm },
                0b010 => Instruction::Sw { rs1, rs2, imm },
                _ => Instruction::Unknown(word),
            }
        }
        0x13 => {
            let (rd, rs1) = (rd(word), rs1(word));
            let shamt = rs2(word);
            match (funct3(word), funct7(word)) {
                (0b000, _) => Instruction::Addi {
                    rd,
                    rs1,
                    imm: imm_i(word),
                },
                (0b010, _) => Instruction::Slti {
                    rd,
                    rs1,
                    imm: imm_i(word),
                },
                (0b011, _) => Instruction::Sltiu {
                    rd,
                    rs1,
                    imm: imm_i(word),
                },
                (0b100, _) => Instruction::Xori {
                    rd,
                    rs1,
                    imm: imm_i(word),
                },
                (0b110, _) => Instruction::Ori {
                    rd,
                    rs1,
                    imm: imm_i(word),
                },
                (0b111, _) => Instruction::Andi {
                    rd,
                    rs1,
                    imm: imm_i(word),
                },
                (0b001, 0b0000000) => Instruction::Slli { rd, rs1, shamt },
                (0b101, 0b0000000) => Instruction::Srli { rd, rs1, shamt },
                (0b101, 0b0100000) => Instruction::Srai { rd, rs1, shamt },
                _ => Instruction::Unknown(word),
            }
        }
        0x33 => {
            let (rd, rs1, rs2) = (rd(word), rs1(word), rs2(word));
            match (funct3(word), funct7(word)) {
                (0b000, 0b0000000) => Instruction::Add { rd, rs1, rs2 },
                (0b000, 0b0100000) => Instruction::Sub { rd, rs1, rs2 },
                (0b001, 0b0000000) => Instruction::Sll { rd, rs1, rs2 },
                (0b010, 0b0000000) => Instruction::Slt { rd, rs1, rs2 },
                (0b011, 0b0000000) => Instruction::Sltu { rd, rs1, rs2 },
                (0b100, 0b0000000) => Instruction::Xor { rd, rs1, rs2 },
                (0b101, 0b0000000) => Instruction::Srl { rd, rs1, rs2 },
                (0b101, 0b0100000) => Instruction::Sra { rd, rs1, rs2 },
                (0b110, 0b0000000) => Instruction::Or { rd, rs1, rs2 },
                (0b111, 0b0000000) => Instruction::And { rd, rs1, rs2 },
                _ => Instruction::Unknown(word),
            }
        }
        0x0F => Instruction::Fence,
        0x73 => match word {
            0x0000_0073 => Instruction::Ecall,
            0x0010_0073 => Instruction::Ebreak,
            _ => Instruction::Unknown(word),
        },
        _ => Instruction::Unknown(word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_lui_and_auipc() {
        // LUI a0, 0x10000 -> 0x10000537
        assert_eq!(
            decode_rv32(0x1000_0537),
            Instruction::Lui {
                rd: 10,
                imm: 0x1000_0000
            }
        );
        // AUIPC a1, 0 -> 0x00000597
        assert_eq!(decode_rv32(0x0000_0597), Instruction::Auipc { rd: 11, imm: 0 });
    }

    #[test]
    fn decodes_negative_jal_offset() {
        // JAL x0, -16 -> 0xFF1FF06F
        assert_eq!(decode_rv32(0xFF1F_F06F), Instruction::Jal { rd: 0, imm: -16 });
        // JAL x0, 0 (jump-to-self) -> 0x0000006F
        assert_eq!(decode_rv32(0x0000_006F), Instruction::Jal { rd: 0, imm: 0 });
    }

    #[test]
    fn decodes_branch_offsets() {
        // BEQ a2, x0, +16 -> 0x00060863
        assert_eq!(
            decode_rv32(0x0006_0863),
            Instruction::Beq {
                rs1: 12,
                rs2: 0,
                imm: 16
            }
        );
    }

    #[test]
    fn decodes_loads_and_stores() {
        // LBU a2, 0(a1) -> 0x0005C603
        assert_eq!(
            decode_rv32(0x0005_C603),
            Instruction::Lbu {
                rd: 12,
                rs1: 11,
                imm: 0
            }
        );
        // SB a2, 0(a0) -> 0x00C50023
        assert_eq!(
            decode_rv32(0x00C5_0023),
            Instruction::Sb {
                rs1: 10,
                rs2: 12,
                imm: 0
            }
        );
        // SW x5, -4(x2) -> imm[11:5]=0x7F, imm[4:0]=0x1C
        // 1111111 00101 00010 010 11100 0100011 -> 0xFE512E23
        assert_eq!(
            decode_rv32(0xFE51_2E23),
            Instruction::Sw {
                rs1: 2,
                rs2: 5,
                imm: -4
            }
        );
    }

    #[test]
    fn decodes_op_imm_and_shifts() {
        // ADDI a1, a1, 1 -> 0x00158593
        assert_eq!(
            decode_rv32(0x0015_8593),
            Instruction::Addi {
                rd: 11,
                rs1: 11,
                imm: 1
            }
        );
        // ADDI x1, x0, -1 -> 0xFFF00093
        assert_eq!(
            decode_rv32(0xFFF0_0093),
            Instruction::Addi {
                rd: 1,
                rs1: 0,
                imm: -1
            }
        );
        // SRAI x1, x1, 4 -> 0x4040D093
        assert_eq!(
            decode_rv32(0x4040_D093),
            Instruction::Srai {
                rd: 1,
                rs1: 1,
                shamt: 4
            }
        );
    }

    #[test]
    fn decodes_system_instructions() {
        assert_eq!(decode_rv32(0x0000_0073), Instruction::Ecall);
        assert_eq!(decode_rv32(0x0010_0073), Instruction::Ebreak);
    }

    #[test]
    fn garbage_decodes_to_unknown() {
        assert_eq!(decode_rv32(0xFFFF_FFFF), Instruction::Unknown(0xFFFF_FFFF));
        assert_eq!(decode_rv32(0), Instruction::Unknown(0));
    }
}
