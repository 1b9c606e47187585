#![no_main]
use bender_cc::codec;
use bender_cc::registers;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Interpret the input as u16 register stream in big-endian pairs
    let regs: Vec<u16> = data
        .chunks_exact(2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .collect();

    // Exercise the decoders under varying lengths
    let _ = codec::decode_u32(&regs);
    let _ = codec::decode_triplet(&regs, 1000.0, true);
    let _ = codec::decode_text(&regs);
    for reg in [
        registers::CURRENTS,
        registers::PHASE_ENERGY,
        registers::ACTIVE_POWER,
        registers::TOTAL_ENERGY,
        registers::EVCCID,
        registers::CHARGE_POINT_STATE,
    ] {
        let _ = codec::decode(reg, &regs);
    }
});
