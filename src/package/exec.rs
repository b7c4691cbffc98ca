// src/package/exec.rs

//! Executable payload detection by leading magic bytes
//!
//! Detection is a pure function of a file's first bytes, so it behaves the
//! same on every build host: shebang scripts, ELF images, and the six
//! Mach-O magic words are executable regardless of file extension or any
//! permission bits already present in the source tree.

/// How many leading bytes detection needs
pub const MAGIC_LEN: usize = 4;

const ELF: [u8; 4] = [0x7f, b'E', b'L', b'F'];

const MACH_O: [[u8; 4]; 6] = [
    [0xCA, 0xFE, 0xBA, 0xBE], // fat, big endian
    [0xBE, 0xBA, 0xFE, 0xCA], // fat, little endian
    [0xFE, 0xED, 0xFA, 0xCE], // 32-bit, big endian
    [0xCE, 0xFA, 0xED, 0xFE], // 32-bit, little endian
    [0xFE, 0xED, 0xFA, 0xCF], // 64-bit, big endian
    [0xCF, 0xFA, 0xED, 0xFE], // 64-bit, little endian
];

/// Whether a file starting with these bytes should carry the executable bit
pub fn is_executable_payload(prefix: &[u8]) -> bool {
    if prefix.len() >= 2 && prefix[0] == b'#' && prefix[1] == b'!' {
        return true;
    }
    if prefix.len() < MAGIC_LEN {
        return false;
    }
    let magic: [u8; MAGIC_LEN] = match prefix[..MAGIC_LEN].try_into() {
        Ok(magic) => magic,
        Err(_) => return false,
    };
    magic == ELF || MACH_O.contains(&magic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shebang_scripts() {
        assert!(is_executable_payload(b"#!/bin/sh\necho hi\n"));
        assert!(is_executable_payload(b"#!/usr/bin/env python3\n"));
        // two bytes are enough for a shebang
        assert!(is_executable_payload(b"#!"));
    }

    #[test]
    fn test_elf_magic() {
        assert!(is_executable_payload(&[0x7f, b'E', b'L', b'F', 0x02, 0x01]));
    }

    #[test]
    fn test_all_mach_o_magics() {
        for magic in MACH_O {
            assert!(is_executable_payload(&magic), "magic {:02x?}", magic);
        }
    }

    #[test]
    fn test_plain_files_ignored() {
        assert!(!is_executable_payload(b"int main(void)"));
        assert!(!is_executable_payload(b"# a comment, not a shebang"));
        assert!(!is_executable_payload(b""));
        assert!(!is_executable_payload(&[0x7f, b'E', b'L']));
        // near-miss on a Mach-O magic
        assert!(!is_executable_payload(&[0xCA, 0xFE, 0xBA, 0xBF]));
    }
}
