//! Integration-level frame codec checks, exercised through the public API
//! rather than internal helpers.

use ltfec::frame::{
    decode_frame, encode_data_frame, encode_parity_frame, encoded_size, flags2_get, flags2_pack,
    verify_payload_crc, FecSchemeId,
};
use ltfec::{BaseHeader, ParitySubheader};

#[test]
fn round_trips_a_full_block_of_frames() {
    let n = 8u16;
    let k = 1u16;
    let l = 1200usize;
    let payloads: Vec<Vec<u8>> = (0..n)
        .map(|i| (0..l).map(|b| (b as u8).wrapping_add(i as u8)).collect())
        .collect();

    let mut frames = Vec::new();
    for (i, payload) in payloads.iter().enumerate() {
        let header = BaseHeader {
            version: 1,
            flags1: 0,
            flags2: flags2_pack(k),
            gen_id: 42,
            seq_in_block: i as u16,
            data_count: n,
            parity_count: k,
            payload_len: l as u16,
        };
        let mut buf = vec![0u8; encoded_size(l, false)];
        encode_data_frame(&mut buf, &header, payload).unwrap();
        frames.push(buf);
    }

    for (i, frame) in frames.iter().enumerate() {
        let decoded = decode_frame(frame).unwrap();
        assert_eq!(decoded.header.seq_in_block, i as u16);
        assert_eq!(decoded.header.gen_id, 42);
        assert_eq!(flags2_get(decoded.header.flags2), k - 1);
        assert_eq!(decoded.payload, payloads[i].as_slice());
        assert!(verify_payload_crc(decoded.payload, decoded.crc));
    }
}

#[test]
fn parity_frame_round_trips_with_subheader() {
    let header = BaseHeader {
        version: 1,
        flags1: 0,
        flags2: flags2_pack(3),
        gen_id: 7,
        seq_in_block: 4,
        data_count: 4,
        parity_count: 3,
        payload_len: 6,
    };
    let sub = ParitySubheader {
        fec_scheme_id: FecSchemeId::Gf256K3.as_u8(),
        fec_parity_index: 0,
    };
    let mut buf = vec![0u8; encoded_size(6, true)];
    encode_parity_frame(&mut buf, &header, &sub, b"PARITY").unwrap();

    let decoded = decode_frame(&buf).unwrap();
    let ps = decoded.subheader.expect("parity frame must carry a subheader");
    assert_eq!(ps.fec_scheme_id, FecSchemeId::Gf256K3.as_u8());
    assert_eq!(ps.fec_parity_index, 0);
    assert_eq!(decoded.payload, b"PARITY");
}

#[test]
fn truncated_and_corrupted_frames_are_rejected() {
    let header = BaseHeader {
        version: 1,
        flags1: 0,
        flags2: flags2_pack(1),
        gen_id: 1,
        seq_in_block: 0,
        data_count: 1,
        parity_count: 1,
        payload_len: 4,
    };
    let mut buf = vec![0u8; encoded_size(4, false)];
    encode_data_frame(&mut buf, &header, b"abcd").unwrap();

    assert!(decode_frame(&buf[..buf.len() - 1]).is_err());

    let decoded = decode_frame(&buf).unwrap();
    assert!(!verify_payload_crc(decoded.payload, decoded.crc.wrapping_add(1)));
}
