use tracing::debug;

use crate::clr::bytes::{compressed_u32, slice, u16_at, u8_at};
use crate::clr::heaps::Streams;
use crate::clr::pe::PeImage;
use crate::clr::scan;
use crate::clr::tables::{Coded, Table, TableStream};
use crate::clr::{ImageError, ImageResult};

const TYPE_ATTR_INTERFACE: u32 = 0x0020;
const METHOD_ATTR_STATIC: u32 = 0x0010;
const SEMANTICS_GETTER: u32 = 0x0002;

const SIG_PROPERTY: u8 = 0x08;
const ELEMENT_TYPE_STRING: u8 = 0x0E;
const ELEMENT_TYPE_CMOD_REQD: u8 = 0x1F;
const ELEMENT_TYPE_CMOD_OPT: u8 = 0x20;

const PLUGIN_INTERFACE: &str = "IPlugin";
const PLUGIN_ID_PROPERTY: &str = "PluginID";

/// A parsed assembly image with its metadata streams and tables.
pub struct Assembly<'a> {
    image: PeImage<'a>,
    streams: Streams<'a>,
    tables: TableStream<'a>,
}

impl<'a> Assembly<'a> {
    pub fn parse(data: &'a [u8]) -> ImageResult<Self> {
        let image = PeImage::parse(data)?;
        let streams = Streams::parse(image.metadata_bytes()?)?;
        let tables = TableStream::parse(streams.tables)?;

        debug!(
            types = tables.row_count(Table::TypeDef),
            methods = tables.row_count(Table::MethodDef),
            attributes = tables.row_count(Table::CustomAttribute),
            "parsed assembly metadata"
        );

        Ok(Self {
            image,
            streams,
            tables,
        })
    }

    /// First string argument of the assembly-level attribute `namespace.name`.
    ///
    /// `None` when the attribute is absent or its argument is a null string.
    pub fn attribute(&self, namespace: &str, name: &str) -> ImageResult<Option<String>> {
        let t = &self.tables;
        for row in t.rows(Table::CustomAttribute) {
            let parent = Coded::HasCustomAttribute.decode(t.cell(Table::CustomAttribute, row, 0)?);
            if !matches!(parent, Some((Table::Assembly, _))) {
                continue;
            }

            let ctor = t.cell(Table::CustomAttribute, row, 1)?;
            let Some(owner) = self.constructor_owner(ctor)? else {
                continue;
            };
            if self.type_name(owner)? != Some((namespace, name)) {
                continue;
            }

            let value = self.streams.blob(t.cell(Table::CustomAttribute, row, 2)?)?;
            return first_string_argument(value);
        }
        Ok(None)
    }

    /// Literal returned by the static `PluginID` property of the plugin class.
    pub fn plugin_id(&self) -> ImageResult<Option<String>> {
        let Some(main) = self.main_type()? else {
            debug!("no class implements {PLUGIN_INTERFACE}");
            return Ok(None);
        };

        let t = &self.tables;
        for map in t.rows(Table::PropertyMap) {
            if t.cell(Table::PropertyMap, map, 0)? != main {
                continue;
            }

            let start = t.cell(Table::PropertyMap, map, 1)?;
            let end = t.list_end(Table::PropertyMap, map, 1, Table::Property)?;
            for property in start..end {
                let name = self.streams.string(t.cell(Table::Property, property, 1)?)?;
                if name != PLUGIN_ID_PROPERTY {
                    continue;
                }
                let signature = self.streams.blob(t.cell(Table::Property, property, 2)?)?;
                if !is_string_property(signature)? {
                    continue;
                }
                let Some(getter) = self.static_getter(property)? else {
                    continue;
                };
                if let Some(literal) = self.first_literal(getter)? {
                    return Ok(Some(literal));
                }
            }
        }
        Ok(None)
    }

    /// First class (in definition order) that implements `IPlugin`.
    fn main_type(&self) -> ImageResult<Option<u32>> {
        let t = &self.tables;
        for ty in t.rows(Table::TypeDef) {
            if t.cell(Table::TypeDef, ty, 0)? & TYPE_ATTR_INTERFACE != 0 {
                continue;
            }
            for imp in t.rows(Table::InterfaceImpl) {
                if t.cell(Table::InterfaceImpl, imp, 0)? != ty {
                    continue;
                }
                let Some(iface) = Coded::TypeDefOrRef.decode(t.cell(Table::InterfaceImpl, imp, 1)?)
                else {
                    continue;
                };
                if let Some((_, iface_name)) = self.type_name(iface)? {
                    if iface_name == PLUGIN_INTERFACE {
                        return Ok(Some(ty));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Getter of `property`, if it is a static method.
    fn static_getter(&self, property: u32) -> ImageResult<Option<u32>> {
        let t = &self.tables;
        for row in t.rows(Table::MethodSemantics) {
            if t.cell(Table::MethodSemantics, row, 0)? & SEMANTICS_GETTER == 0 {
                continue;
            }
            let association = Coded::HasSemantics.decode(t.cell(Table::MethodSemantics, row, 2)?);
            if association != Some((Table::Property, property)) {
                continue;
            }
            let method = t.cell(Table::MethodSemantics, row, 1)?;
            if t.cell(Table::MethodDef, method, 2)? & METHOD_ATTR_STATIC != 0 {
                return Ok(Some(method));
            }
        }
        Ok(None)
    }

    /// First non-empty `ldstr` literal in the body of `method`.
    fn first_literal(&self, method: u32) -> ImageResult<Option<String>> {
        let rva = self.tables.cell(Table::MethodDef, method, 0)?;
        if rva == 0 {
            return Ok(None);
        }

        let code = scan::method_code(self.image.data(), self.image.offset(rva)?)?;
        for index in scan::string_literals(code)? {
            let literal = self.streams.user_string(index)?;
            if !literal.is_empty() {
                return Ok(Some(literal));
            }
        }
        Ok(None)
    }

    /// Type that declares the attribute constructor `ctor`.
    fn constructor_owner(&self, ctor: u32) -> ImageResult<Option<(Table, u32)>> {
        match Coded::CustomAttributeType.decode(ctor) {
            Some((Table::MemberRef, row)) => {
                let class = self.tables.cell(Table::MemberRef, row, 0)?;
                Ok(Coded::MemberRefParent.decode(class))
            }
            Some((Table::MethodDef, row)) => {
                Ok(self.method_owner(row)?.map(|ty| (Table::TypeDef, ty)))
            }
            _ => Ok(None),
        }
    }

    /// TypeDef whose method list contains `method`.
    fn method_owner(&self, method: u32) -> ImageResult<Option<u32>> {
        let t = &self.tables;
        for ty in t.rows(Table::TypeDef) {
            let start = t.cell(Table::TypeDef, ty, 5)?;
            let end = t.list_end(Table::TypeDef, ty, 5, Table::MethodDef)?;
            if (start..end).contains(&method) {
                return Ok(Some(ty));
            }
        }
        Ok(None)
    }

    /// `(namespace, name)` of a TypeRef or TypeDef row.
    fn type_name(&self, (table, row): (Table, u32)) -> ImageResult<Option<(&'a str, &'a str)>> {
        match table {
            Table::TypeRef | Table::TypeDef => {
                let name = self.streams.string(self.tables.cell(table, row, 1)?)?;
                let namespace = self.streams.string(self.tables.cell(table, row, 2)?)?;
                Ok(Some((namespace, name)))
            }
            _ => Ok(None),
        }
    }
}

/// Decodes the leading `SerString` of a custom attribute value blob.
fn first_string_argument(value: &[u8]) -> ImageResult<Option<String>> {
    if u16_at(value, 0)? != 0x0001 {
        return Err(ImageError::new("invalid custom attribute prolog"));
    }
    // 0xFF encodes a null string.
    if u8_at(value, 2)? == 0xFF {
        return Ok(None);
    }
    let (len, prefix) = compressed_u32(value, 2)?;
    let bytes = slice(value, 2 + prefix, len as usize)?;
    let text = std::str::from_utf8(bytes)
        .map_err(|_| ImageError::new("custom attribute string is not UTF-8"))?;
    Ok(Some(text.to_string()))
}

/// Whether a property signature describes a `string` property.
fn is_string_property(signature: &[u8]) -> ImageResult<bool> {
    if u8_at(signature, 0)? & 0x0F != SIG_PROPERTY {
        return Ok(false);
    }
    let (_, prefix) = compressed_u32(signature, 1)?;
    let mut at = 1 + prefix;
    loop {
        match u8_at(signature, at)? {
            ELEMENT_TYPE_CMOD_REQD | ELEMENT_TYPE_CMOD_OPT => {
                let (_, len) = compressed_u32(signature, at + 1)?;
                at += 1 + len;
            }
            ty => return Ok(ty == ELEMENT_TYPE_STRING),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_string_argument_is_decoded() {
        let mut blob = vec![0x01, 0x00, 0x18];
        blob.extend_from_slice(b".NETCoreApp,Version=v9.0");
        blob.extend_from_slice(&[0x00, 0x00]);
        assert_eq!(
            first_string_argument(&blob).unwrap().as_deref(),
            Some(".NETCoreApp,Version=v9.0")
        );
    }

    #[test]
    fn null_attribute_string_is_none() {
        assert_eq!(first_string_argument(&[0x01, 0x00, 0xFF]).unwrap(), None);
    }

    #[test]
    fn bad_prolog_is_an_error() {
        assert!(first_string_argument(&[0x02, 0x00, 0x00]).is_err());
    }

    #[test]
    fn string_property_signatures() {
        // static string P { get; }
        assert!(is_string_property(&[0x08, 0x00, 0x0E]).unwrap());
        // instance string P { get; }
        assert!(is_string_property(&[0x28, 0x00, 0x0E]).unwrap());
        // static int P { get; }
        assert!(!is_string_property(&[0x08, 0x00, 0x08]).unwrap());
        // modopt(T) string
        assert!(is_string_property(&[0x08, 0x00, 0x20, 0x09, 0x0E]).unwrap());
        // method signature, not a property
        assert!(!is_string_property(&[0x00, 0x00, 0x0E]).unwrap());
    }
}
