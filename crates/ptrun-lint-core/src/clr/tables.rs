//! The `#~` table stream (ECMA-335 II.22, II.24.2.6).
//!
//! Tables are stored back to back, so the row size of every table that
//! precedes the ones we read must be known. The schema below covers all
//! tables up to `GenericParamConstraint`; later (debug) tables only ever
//! follow the ones we need.

use crate::clr::bytes::{index_at, u8_at, u32_at, u64_at, u16_at};
use crate::clr::{ImageError, ImageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Table {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    FieldPtr = 0x03,
    Field = 0x04,
    MethodPtr = 0x05,
    MethodDef = 0x06,
    ParamPtr = 0x07,
    Param = 0x08,
    InterfaceImpl = 0x09,
    MemberRef = 0x0A,
    Constant = 0x0B,
    CustomAttribute = 0x0C,
    FieldMarshal = 0x0D,
    DeclSecurity = 0x0E,
    ClassLayout = 0x0F,
    FieldLayout = 0x10,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    EventPtr = 0x13,
    Event = 0x14,
    PropertyMap = 0x15,
    PropertyPtr = 0x16,
    Property = 0x17,
    MethodSemantics = 0x18,
    MethodImpl = 0x19,
    ModuleRef = 0x1A,
    TypeSpec = 0x1B,
    ImplMap = 0x1C,
    FieldRva = 0x1D,
    EncLog = 0x1E,
    EncMap = 0x1F,
    Assembly = 0x20,
    AssemblyProcessor = 0x21,
    AssemblyOs = 0x22,
    AssemblyRef = 0x23,
    AssemblyRefProcessor = 0x24,
    AssemblyRefOs = 0x25,
    File = 0x26,
    ExportedType = 0x27,
    ManifestResource = 0x28,
    NestedClass = 0x29,
    GenericParam = 0x2A,
    MethodSpec = 0x2B,
    GenericParamConstraint = 0x2C,
}

const KNOWN_TABLES: usize = 0x2D;

/// Coded index kinds (II.24.2.6). `None` marks an unused tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coded {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    Implementation,
    CustomAttributeType,
    ResolutionScope,
    TypeOrMethodDef,
}

impl Coded {
    fn tables(self) -> &'static [Option<Table>] {
        use Table::*;
        match self {
            Self::TypeDefOrRef => &[Some(TypeDef), Some(TypeRef), Some(TypeSpec)],
            Self::HasConstant => &[Some(Field), Some(Param), Some(Property)],
            Self::HasCustomAttribute => &[
                Some(MethodDef),
                Some(Field),
                Some(TypeRef),
                Some(TypeDef),
                Some(Param),
                Some(InterfaceImpl),
                Some(MemberRef),
                Some(Module),
                Some(DeclSecurity),
                Some(Property),
                Some(Event),
                Some(StandAloneSig),
                Some(ModuleRef),
                Some(TypeSpec),
                Some(Assembly),
                Some(AssemblyRef),
                Some(File),
                Some(ExportedType),
                Some(ManifestResource),
                Some(GenericParam),
                Some(GenericParamConstraint),
                Some(MethodSpec),
            ],
            Self::HasFieldMarshal => &[Some(Field), Some(Param)],
            Self::HasDeclSecurity => &[Some(TypeDef), Some(MethodDef), Some(Assembly)],
            Self::MemberRefParent => &[
                Some(TypeDef),
                Some(TypeRef),
                Some(ModuleRef),
                Some(MethodDef),
                Some(TypeSpec),
            ],
            Self::HasSemantics => &[Some(Event), Some(Property)],
            Self::MethodDefOrRef => &[Some(MethodDef), Some(MemberRef)],
            Self::MemberForwarded => &[Some(Field), Some(MethodDef)],
            Self::Implementation => &[Some(File), Some(AssemblyRef), Some(ExportedType)],
            Self::CustomAttributeType => &[None, None, Some(MethodDef), Some(MemberRef), None],
            Self::ResolutionScope => &[
                Some(Module),
                Some(ModuleRef),
                Some(AssemblyRef),
                Some(TypeRef),
            ],
            Self::TypeOrMethodDef => &[Some(TypeDef), Some(MethodDef)],
        }
    }

    fn tag_bits(self) -> u32 {
        let n = self.tables().len() as u32;
        u32::BITS - (n - 1).leading_zeros()
    }

    /// Splits a coded value into its table and 1-based row.
    pub fn decode(self, value: u32) -> Option<(Table, u32)> {
        let bits = self.tag_bits();
        let tag = (value & ((1 << bits) - 1)) as usize;
        let row = value >> bits;
        let table = (*self.tables().get(tag)?)?;
        (row != 0).then_some((table, row))
    }
}

#[derive(Debug, Clone, Copy)]
enum Col {
    U16,
    U32,
    Str,
    Guid,
    Blob,
    Index(Table),
    CodedIndex(Coded),
}

fn schema(table: Table) -> &'static [Col] {
    use Col::*;
    use Table as T;
    match table {
        T::Module => &[U16, Str, Guid, Guid, Guid],
        T::TypeRef => &[CodedIndex(Coded::ResolutionScope), Str, Str],
        T::TypeDef => &[
            U32,
            Str,
            Str,
            CodedIndex(Coded::TypeDefOrRef),
            Index(T::Field),
            Index(T::MethodDef),
        ],
        T::FieldPtr => &[Index(T::Field)],
        T::Field => &[U16, Str, Blob],
        T::MethodPtr => &[Index(T::MethodDef)],
        T::MethodDef => &[U32, U16, U16, Str, Blob, Index(T::Param)],
        T::ParamPtr => &[Index(T::Param)],
        T::Param => &[U16, U16, Str],
        T::InterfaceImpl => &[Index(T::TypeDef), CodedIndex(Coded::TypeDefOrRef)],
        T::MemberRef => &[CodedIndex(Coded::MemberRefParent), Str, Blob],
        T::Constant => &[U16, CodedIndex(Coded::HasConstant), Blob],
        T::CustomAttribute => &[
            CodedIndex(Coded::HasCustomAttribute),
            CodedIndex(Coded::CustomAttributeType),
            Blob,
        ],
        T::FieldMarshal => &[CodedIndex(Coded::HasFieldMarshal), Blob],
        T::DeclSecurity => &[U16, CodedIndex(Coded::HasDeclSecurity), Blob],
        T::ClassLayout => &[U16, U32, Index(T::TypeDef)],
        T::FieldLayout => &[U32, Index(T::Field)],
        T::StandAloneSig => &[Blob],
        T::EventMap => &[Index(T::TypeDef), Index(T::Event)],
        T::EventPtr => &[Index(T::Event)],
        T::Event => &[U16, Str, CodedIndex(Coded::TypeDefOrRef)],
        T::PropertyMap => &[Index(T::TypeDef), Index(T::Property)],
        T::PropertyPtr => &[Index(T::Property)],
        T::Property => &[U16, Str, Blob],
        T::MethodSemantics => &[U16, Index(T::MethodDef), CodedIndex(Coded::HasSemantics)],
        T::MethodImpl => &[
            Index(T::TypeDef),
            CodedIndex(Coded::MethodDefOrRef),
            CodedIndex(Coded::MethodDefOrRef),
        ],
        T::ModuleRef => &[Str],
        T::TypeSpec => &[Blob],
        T::ImplMap => &[
            U16,
            CodedIndex(Coded::MemberForwarded),
            Str,
            Index(T::ModuleRef),
        ],
        T::FieldRva => &[U32, Index(T::Field)],
        T::EncLog => &[U32, U32],
        T::EncMap => &[U32],
        T::Assembly => &[U32, U16, U16, U16, U16, U32, Blob, Str, Str],
        T::AssemblyProcessor => &[U32],
        T::AssemblyOs => &[U32, U32, U32],
        T::AssemblyRef => &[U16, U16, U16, U16, U32, Blob, Str, Str, Blob],
        T::AssemblyRefProcessor => &[U32, Index(T::AssemblyRef)],
        T::AssemblyRefOs => &[U32, U32, U32, Index(T::AssemblyRef)],
        T::File => &[U32, Str, Blob],
        T::ExportedType => &[U32, U32, Str, Str, CodedIndex(Coded::Implementation)],
        T::ManifestResource => &[U32, U32, Str, CodedIndex(Coded::Implementation)],
        T::NestedClass => &[Index(T::TypeDef), Index(T::TypeDef)],
        T::GenericParam => &[U16, U16, CodedIndex(Coded::TypeOrMethodDef), Str],
        T::MethodSpec => &[CodedIndex(Coded::MethodDefOrRef), Blob],
        T::GenericParamConstraint => &[Index(T::GenericParam), CodedIndex(Coded::TypeDefOrRef)],
    }
}

const ALL_TABLES: [Table; KNOWN_TABLES] = {
    use Table::*;
    [
        Module,
        TypeRef,
        TypeDef,
        FieldPtr,
        Field,
        MethodPtr,
        MethodDef,
        ParamPtr,
        Param,
        InterfaceImpl,
        MemberRef,
        Constant,
        CustomAttribute,
        FieldMarshal,
        DeclSecurity,
        ClassLayout,
        FieldLayout,
        StandAloneSig,
        EventMap,
        EventPtr,
        Event,
        PropertyMap,
        PropertyPtr,
        Property,
        MethodSemantics,
        MethodImpl,
        ModuleRef,
        TypeSpec,
        ImplMap,
        FieldRva,
        EncLog,
        EncMap,
        Assembly,
        AssemblyProcessor,
        AssemblyOs,
        AssemblyRef,
        AssemblyRefProcessor,
        AssemblyRefOs,
        File,
        ExportedType,
        ManifestResource,
        NestedClass,
        GenericParam,
        MethodSpec,
        GenericParamConstraint,
    ]
};

#[derive(Debug, Clone, Default)]
struct Layout {
    offset: usize,
    row_size: usize,
    /// Byte offset and width of each column within a row.
    columns: Vec<(usize, usize)>,
}

/// Decoded `#~` stream header with per-table row layouts.
#[derive(Debug)]
pub struct TableStream<'a> {
    data: &'a [u8],
    rows: [u32; 64],
    layouts: Vec<Layout>,
}

impl<'a> TableStream<'a> {
    pub fn parse(data: &'a [u8]) -> ImageResult<Self> {
        let heap_sizes = u8_at(data, 6)?;
        let valid = u64_at(data, 8)?;

        let mut rows = [0u32; 64];
        let mut at = 24;
        for (bit, count) in rows.iter_mut().enumerate() {
            if valid & (1 << bit) != 0 {
                *count = u32_at(data, at)?;
                at += 4;
            }
        }
        // Uncompressed streams may carry an extra data word.
        if heap_sizes & 0x40 != 0 {
            at += 4;
        }

        let str_width = if heap_sizes & 0x01 != 0 { 4 } else { 2 };
        let guid_width = if heap_sizes & 0x02 != 0 { 4 } else { 2 };
        let blob_width = if heap_sizes & 0x04 != 0 { 4 } else { 2 };

        let index_width = |table: Table| {
            if rows[table as usize] < 0x1_0000 { 2 } else { 4 }
        };
        let coded_width = |coded: Coded| {
            let max = coded
                .tables()
                .iter()
                .flatten()
                .map(|t| rows[*t as usize])
                .max()
                .unwrap_or(0);
            if max < (1 << (16 - coded.tag_bits())) { 2 } else { 4 }
        };

        let mut layouts = Vec::with_capacity(KNOWN_TABLES);
        for table in ALL_TABLES {
            let mut columns = Vec::new();
            let mut row_size = 0;
            for col in schema(table) {
                let width = match col {
                    Col::U16 => 2,
                    Col::U32 => 4,
                    Col::Str => str_width,
                    Col::Guid => guid_width,
                    Col::Blob => blob_width,
                    Col::Index(t) => index_width(*t),
                    Col::CodedIndex(c) => coded_width(*c),
                };
                columns.push((row_size, width));
                row_size += width;
            }
            layouts.push(Layout {
                offset: at,
                row_size,
                columns,
            });
            at += row_size * rows[table as usize] as usize;
        }

        if at > data.len() {
            return Err(ImageError::new("table stream is truncated"));
        }

        Ok(Self {
            data,
            rows,
            layouts,
        })
    }

    pub fn row_count(&self, table: Table) -> u32 {
        self.rows[table as usize]
    }

    /// Reads column `col` of 1-based row `row`.
    pub fn cell(&self, table: Table, row: u32, col: usize) -> ImageResult<u32> {
        if row == 0 || row > self.row_count(table) {
            return Err(ImageError::new(format!(
                "row {row} out of range for {table:?}"
            )));
        }
        let layout = &self.layouts[table as usize];
        let (col_offset, width) = *layout
            .columns
            .get(col)
            .ok_or_else(|| ImageError::new(format!("column {col} out of range for {table:?}")))?;
        let at = layout.offset + (row as usize - 1) * layout.row_size + col_offset;
        match width {
            2 => u16_at(self.data, at).map(u32::from),
            _ => index_at(self.data, at, width),
        }
    }

    /// Iterates the 1-based row ids of `table`.
    pub fn rows(&self, table: Table) -> impl Iterator<Item = u32> {
        1..=self.row_count(table)
    }

    /// End (exclusive) of a list column such as `TypeDef.MethodList`:
    /// the next row's start, or one past the target table.
    pub fn list_end(&self, table: Table, row: u32, col: usize, target: Table) -> ImageResult<u32> {
        if row < self.row_count(table) {
            self.cell(table, row + 1, col)
        } else {
            Ok(self.row_count(target) + 1)
        }
    }
}
