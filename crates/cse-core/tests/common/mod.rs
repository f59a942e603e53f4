#![allow(dead_code)]

use std::io::{Cursor, Write as _};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SPEC_GAMESTATE: &str =
    "planets={\n 0={ name={ key=\"PLANET1\" } planet_class=\"pc_ocean\" planet_size=16 }\n}";

// Shaped like a real save: wrapper blocks, variables, dates, colors, comments.
pub const GAMESTATE: &str = r#"version="Orion v3.4.5"
version_control_revision=91543
date="2230.05.14"
ironman=no
# comment with a stray { brace
player={
	{
		name="unknown"
		country=0
	}
}
empire={ name={ key="United Nations of Earth" } }
planets={
	planet={
		0={
			name={
				key="NAME_Sol"
			}
			planet_class="pc_gas_giant"
			coordinate={
				x=0
				y=0
				origin=4294967295
			}
			planet_size=30
		}
		1={
			name={
				key="format.gen_olig.1"
				variables={
					{
						key="NAME"
						value={
							key="Earth"
						}
					}
				}
			}
			planet_class="pc_continental"
			planet_size=16
			owner=0
			owner=1
		}
	}
}
flag={ colors={ "dark_blue" "blue" } background={ category="circle" } }
color=hsv { 0.55 0.40 0.80 }
"#;

pub fn build_zip(entries: &[(&str, &[u8], CompressionMethod)]) -> Vec<u8> {
    let mut w = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data, method) in entries {
        let opts = FileOptions::default().compression_method(*method);
        w.start_file(*name, opts).unwrap();
        w.write_all(data).unwrap();
    }
    w.finish().unwrap().into_inner()
}

pub fn save_zip(gamestate: &str) -> Vec<u8> {
    build_zip(&[
        ("meta", b"version=\"Orion v3.4.5\"\nname=\"UNE\"\n".as_slice(), CompressionMethod::Stored),
        ("gamestate", gamestate.as_bytes(), CompressionMethod::Deflated),
        ("thumb.bin", [0u8, 159, 146, 150, 255, 0, 1, 2].as_slice(), CompressionMethod::Deflated),
    ])
}

fn header_offsets(
    bytes: &[u8],
    sig: &[u8; 4],
    name_len_at: usize,
    name_at: usize,
    name: &str,
) -> Vec<usize> {
    (0..bytes.len().saturating_sub(name_at))
        .filter(|&i| {
            let len = u16::from_le_bytes([bytes[i + name_len_at], bytes[i + name_len_at + 1]]) as usize;
            &bytes[i..i + 4] == sig
                && len == name.len()
                && bytes.get(i + name_at..i + name_at + len) == Some(name.as_bytes())
        })
        .collect()
}

/// Rewrites the method id of `name` in its local and central headers. The data
/// is left as is, so this fakes an entry compressed with a method we can't decode.
pub fn set_entry_method(bytes: &mut [u8], name: &str, method: u16) {
    let local = header_offsets(bytes, b"PK\x03\x04", 26, 30, name);
    let central = header_offsets(bytes, b"PK\x01\x02", 28, 46, name);
    assert_eq!((local.len(), central.len()), (1, 1), "headers of {name}");
    bytes[local[0] + 8..local[0] + 10].copy_from_slice(&method.to_le_bytes());
    bytes[central[0] + 10..central[0] + 12].copy_from_slice(&method.to_le_bytes());
}

/// Overwrites the uncompressed size `name` claims in the central directory.
pub fn set_entry_claimed_size(bytes: &mut [u8], name: &str, size: u32) {
    let central = header_offsets(bytes, b"PK\x01\x02", 28, 46, name);
    assert_eq!(central.len(), 1, "central header of {name}");
    bytes[central[0] + 24..central[0] + 28].copy_from_slice(&size.to_le_bytes());
}
