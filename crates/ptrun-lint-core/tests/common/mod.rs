//! Fixtures shared by the integration tests: plugin packages written with
//! the `zip` crate and a minimal hand-assembled CLI assembly.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const PLUGIN_ID: &str = "5D3E7BB8F9C34A4BA6D2B1E0C5A4F3E2";
pub const TARGET_FRAMEWORK: &str = ".NETCoreApp,Version=v9.0";
pub const TARGET_PLATFORM: &str = "Windows7.0";
pub const OWNER: &str = "hlaueriksson";
pub const WEBSITE: &str = "https://github.com/hlaueriksson/Community.PowerToys.Run.Plugin.Valid";

/// `plugin.json` of the valid fixture package.
pub fn valid_metadata() -> serde_json::Value {
    serde_json::json!({
        "ID": PLUGIN_ID,
        "ActionKeyword": "valid",
        "IsGlobal": false,
        "Name": "Valid",
        "Author": OWNER,
        "Version": "0.87.0",
        "Language": "csharp",
        "Website": WEBSITE,
        "ExecuteFileName": "Community.PowerToys.Run.Plugin.Valid.dll",
        "IcoPathDark": "Images\\valid.dark.png",
        "IcoPathLight": "Images\\valid.light.png",
        "DynamicLoading": false
    })
}

/// Entries of a package that passes every package-tier rule.
pub fn valid_entries() -> Vec<(String, Vec<u8>)> {
    vec![
        (
            "Valid/plugin.json".into(),
            serde_json::to_vec_pretty(&valid_metadata()).unwrap(),
        ),
        (
            "Valid/Community.PowerToys.Run.Plugin.Valid.dll".into(),
            AssemblyBuilder::valid().build(),
        ),
        ("Valid/Images/valid.dark.png".into(), b"png".to_vec()),
        ("Valid/Images/valid.light.png".into(), b"png".to_vec()),
    ]
}

pub fn write_zip(path: &Path, entries: &[(String, Vec<u8>)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        writer
            .start_file(name.as_str(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// Writes `entries` as `dir/name` and returns the path.
pub fn zip_in(dir: &Path, name: &str, entries: &[(String, Vec<u8>)]) -> PathBuf {
    let path = dir.join(name);
    write_zip(&path, entries);
    path
}

/// Replaces (or adds) one entry.
pub fn with_entry(
    mut entries: Vec<(String, Vec<u8>)>,
    name: &str,
    content: Vec<u8>,
) -> Vec<(String, Vec<u8>)> {
    entries.retain(|(n, _)| n != name);
    entries.push((name.to_string(), content));
    entries
}

/// Builds a PE32 image whose only section holds a CLI header, one method
/// body and the metadata root.
///
/// The metadata describes an assembly with optional `TargetFramework` and
/// `TargetPlatform` attributes and a class `Main : IPlugin` whose static
/// `PluginID` getter is `ldstr <id>; ret` (or `ldnull; ret` without an id).
#[derive(Debug, Clone, Default)]
pub struct AssemblyBuilder {
    pub target_framework: Option<String>,
    pub target_platform: Option<String>,
    pub plugin_id: Option<String>,
}

const SECTION_RVA: u32 = 0x2000;
const SECTION_RAW: u32 = 0x200;
const CLI_HEADER_SIZE: u32 = 72;
const METHOD_RVA: u32 = SECTION_RVA + CLI_HEADER_SIZE;
const METADATA_RVA: u32 = SECTION_RVA + 0x50;

impl AssemblyBuilder {
    pub fn valid() -> Self {
        Self {
            target_framework: Some(TARGET_FRAMEWORK.into()),
            target_platform: Some(TARGET_PLATFORM.into()),
            plugin_id: Some(PLUGIN_ID.into()),
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let (body, mut heaps) = self.method_body();
        let metadata = self.metadata(&mut heaps);

        let mut section = Vec::new();
        // CLI header
        put_u32(&mut section, CLI_HEADER_SIZE);
        put_u16(&mut section, 2);
        put_u16(&mut section, 5);
        put_u32(&mut section, METADATA_RVA);
        put_u32(&mut section, metadata.len() as u32);
        put_u32(&mut section, 1);
        section.resize(CLI_HEADER_SIZE as usize, 0);

        section.extend_from_slice(&body);
        section.resize((METADATA_RVA - SECTION_RVA) as usize, 0);
        section.extend_from_slice(&metadata);

        let virtual_size = section.len() as u32;
        let raw_size = align(virtual_size, 0x200);
        section.resize(raw_size as usize, 0);

        let mut image = vec![0u8; SECTION_RAW as usize];
        image[0..2].copy_from_slice(b"MZ");
        image[0x3C..0x40].copy_from_slice(&0x80u32.to_le_bytes());

        let mut pe = Vec::new();
        pe.extend_from_slice(b"PE\0\0");
        // COFF header
        put_u16(&mut pe, 0x14C);
        put_u16(&mut pe, 1);
        put_u32(&mut pe, 0);
        put_u32(&mut pe, 0);
        put_u32(&mut pe, 0);
        put_u16(&mut pe, 0xE0);
        put_u16(&mut pe, 0x2102);
        // Optional header: only the fields the reader consults are set.
        let optional = pe.len();
        pe.resize(optional + 0xE0, 0);
        pe[optional..optional + 2].copy_from_slice(&0x10Bu16.to_le_bytes());
        pe[optional + 92..optional + 96].copy_from_slice(&16u32.to_le_bytes());
        let cli = optional + 96 + 14 * 8;
        pe[cli..cli + 4].copy_from_slice(&SECTION_RVA.to_le_bytes());
        pe[cli + 4..cli + 8].copy_from_slice(&CLI_HEADER_SIZE.to_le_bytes());
        // Section header
        pe.extend_from_slice(b".text\0\0\0");
        put_u32(&mut pe, virtual_size);
        put_u32(&mut pe, SECTION_RVA);
        put_u32(&mut pe, raw_size);
        put_u32(&mut pe, SECTION_RAW);
        pe.resize(pe.len() + 16, 0);

        image[0x80..0x80 + pe.len()].copy_from_slice(&pe);
        image.extend_from_slice(&section);
        image
    }

    fn method_body(&self) -> (Vec<u8>, Heaps) {
        let mut heaps = Heaps::new();
        let mut code = Vec::new();
        match &self.plugin_id {
            Some(id) => {
                let index = heaps.user_string(id);
                code.push(0x72);
                put_u32(&mut code, 0x7000_0000 | index);
            }
            None => code.push(0x14),
        }
        code.push(0x2A);

        let mut body = vec![((code.len() as u8) << 2) | 0x02];
        body.extend_from_slice(&code);
        (body, heaps)
    }

    fn metadata(&self, heaps: &mut Heaps) -> Vec<u8> {
        let mut tables = Tables::default();

        // Module
        let module_name = heaps.string("Community.PowerToys.Run.Plugin.Valid.dll");
        tables.row(0x00, &[(0, 2), (module_name, 2), (0, 2), (0, 2), (0, 2)]);

        // TypeRef: the two attributes and IPlugin, scope left null.
        let versioning = heaps.string("System.Runtime.Versioning");
        let framework_attr = heaps.string("TargetFrameworkAttribute");
        let platform_attr = heaps.string("TargetPlatformAttribute");
        let wox = heaps.string("Wox.Plugin");
        let iplugin = heaps.string("IPlugin");
        tables.row(0x01, &[(0, 2), (framework_attr, 2), (versioning, 2)]);
        tables.row(0x01, &[(0, 2), (platform_attr, 2), (versioning, 2)]);
        tables.row(0x01, &[(0, 2), (iplugin, 2), (wox, 2)]);

        // TypeDef: <Module> and Main, which owns the single method.
        let module_type = heaps.string("<Module>");
        let main = heaps.string("Main");
        let namespace = heaps.string("Community.PowerToys.Run.Plugin.Valid");
        tables.row(0x02, &[(0, 4), (module_type, 2), (0, 2), (0, 2), (1, 2), (1, 2)]);
        tables.row(
            0x02,
            &[(0x0010_0001, 4), (main, 2), (namespace, 2), (0, 2), (1, 2), (1, 2)],
        );

        // MethodDef: public static string get_PluginID()
        let getter = heaps.string("get_PluginID");
        let getter_sig = heaps.blob(&[0x00, 0x00, 0x0E]);
        tables.row(
            0x06,
            &[(METHOD_RVA, 4), (0, 2), (0x0896, 2), (getter, 2), (getter_sig, 2), (1, 2)],
        );

        // InterfaceImpl: Main implements TypeRef 3 (IPlugin).
        tables.row(0x09, &[(2, 2), ((3 << 2) | 1, 2)]);

        // MemberRef: the attribute constructors, each taking one string.
        let ctor = heaps.string(".ctor");
        let ctor_sig = heaps.blob(&[0x20, 0x01, 0x01, 0x0E]);
        tables.row(0x0A, &[((1 << 3) | 1, 2), (ctor, 2), (ctor_sig, 2)]);
        tables.row(0x0A, &[((2 << 3) | 1, 2), (ctor, 2), (ctor_sig, 2)]);

        // CustomAttribute on the assembly (HasCustomAttribute tag 14).
        let attributes = [(1u32, &self.target_framework), (2, &self.target_platform)];
        for (member_ref, value) in attributes {
            if let Some(value) = value {
                let blob = heaps.blob(&attribute_value(value));
                tables.row(0x0C, &[((1 << 5) | 14, 2), ((member_ref << 3) | 3, 2), (blob, 2)]);
            }
        }

        // PropertyMap, Property and MethodSemantics for static string PluginID.
        let property = heaps.string("PluginID");
        let property_sig = heaps.blob(&[0x08, 0x00, 0x0E]);
        tables.row(0x15, &[(2, 2), (1, 2)]);
        tables.row(0x17, &[(0, 2), (property, 2), (property_sig, 2)]);
        tables.row(0x18, &[(0x0002, 2), (1, 2), ((1 << 1) | 1, 2)]);

        // Assembly
        let assembly_name = heaps.string("Community.PowerToys.Run.Plugin.Valid");
        tables.row(
            0x20,
            &[
                (0x8004, 4),
                (0, 2),
                (87, 2),
                (0, 2),
                (0, 2),
                (0, 4),
                (0, 2),
                (assembly_name, 2),
                (0, 2),
            ],
        );

        metadata_root(&[
            ("#~", tables.stream()),
            ("#Strings", pad4(heaps.strings.clone())),
            ("#US", pad4(heaps.user_strings.clone())),
            ("#Blob", pad4(heaps.blob.clone())),
        ])
    }
}

/// Custom attribute value blob with a single `SerString` argument.
fn attribute_value(value: &str) -> Vec<u8> {
    let mut blob = vec![0x01, 0x00];
    compress(&mut blob, value.len() as u32);
    blob.extend_from_slice(value.as_bytes());
    blob.extend_from_slice(&[0x00, 0x00]);
    blob
}

struct Heaps {
    strings: Vec<u8>,
    user_strings: Vec<u8>,
    blob: Vec<u8>,
}

impl Heaps {
    fn new() -> Self {
        Self {
            strings: vec![0],
            user_strings: vec![0],
            blob: vec![0],
        }
    }

    fn string(&mut self, value: &str) -> u32 {
        let index = self.strings.len() as u32;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        index
    }

    fn user_string(&mut self, value: &str) -> u32 {
        let index = self.user_strings.len() as u32;
        let units: Vec<u16> = value.encode_utf16().collect();
        compress(&mut self.user_strings, units.len() as u32 * 2 + 1);
        for unit in units {
            self.user_strings.extend_from_slice(&unit.to_le_bytes());
        }
        self.user_strings.push(0);
        index
    }

    fn blob(&mut self, value: &[u8]) -> u32 {
        let index = self.blob.len() as u32;
        compress(&mut self.blob, value.len() as u32);
        self.blob.extend_from_slice(value);
        index
    }
}

/// Rows per table id; every index in these fixtures fits in two bytes.
#[derive(Default)]
struct Tables {
    rows: BTreeMap<u8, (u32, Vec<u8>)>,
}

impl Tables {
    fn row(&mut self, table: u8, cells: &[(u32, usize)]) {
        let (count, data) = self.rows.entry(table).or_default();
        *count += 1;
        for (value, width) in cells {
            match width {
                2 => put_u16(data, *value as u16),
                _ => put_u32(data, *value),
            }
        }
    }

    fn stream(&self) -> Vec<u8> {
        let valid = self.rows.keys().fold(0u64, |mask, t| mask | (1 << t));
        let mut stream = Vec::new();
        put_u32(&mut stream, 0);
        stream.extend_from_slice(&[2, 0, 0, 1]);
        stream.extend_from_slice(&valid.to_le_bytes());
        stream.extend_from_slice(&0u64.to_le_bytes());
        for (count, _) in self.rows.values() {
            put_u32(&mut stream, *count);
        }
        for (_, data) in self.rows.values() {
            stream.extend_from_slice(data);
        }
        pad4(stream)
    }
}

fn metadata_root(streams: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let version = b"v4.0.30319\0\0";

    let mut headers_len = 0;
    for (name, _) in streams {
        headers_len += 8 + align(name.len() as u32 + 1, 4) as usize;
    }
    let mut offset = 16 + version.len() + 4 + headers_len;

    let mut root = Vec::new();
    put_u32(&mut root, 0x424A_5342);
    put_u16(&mut root, 1);
    put_u16(&mut root, 1);
    put_u32(&mut root, 0);
    put_u32(&mut root, version.len() as u32);
    root.extend_from_slice(version);
    put_u16(&mut root, 0);
    put_u16(&mut root, streams.len() as u16);
    for (name, data) in streams {
        put_u32(&mut root, offset as u32);
        put_u32(&mut root, data.len() as u32);
        let mut name = name.as_bytes().to_vec();
        name.push(0);
        root.extend_from_slice(&pad4(name));
        offset += data.len();
    }
    for (_, data) in streams {
        root.extend_from_slice(data);
    }
    root
}

fn compress(out: &mut Vec<u8>, value: u32) {
    if value < 0x80 {
        out.push(value as u8);
    } else {
        out.push(0x80 | (value >> 8) as u8);
        out.push(value as u8);
    }
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn pad4(mut data: Vec<u8>) -> Vec<u8> {
    data.resize(align(data.len() as u32, 4) as usize, 0);
    data
}

fn align(value: u32, to: u32) -> u32 {
    value.div_ceil(to) * to
}
