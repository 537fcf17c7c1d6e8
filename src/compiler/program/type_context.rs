use crate::compiler::compiler_errors::CompileError;
use crate::compiler::program::ast_nodes::TypeRef;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Read-only type environment resolved by the front end.
///
/// Holds every header and struct declaration the program mentions, keyed
/// by name. The backend queries bit widths and field bit positions from
/// it but never adds or rewrites anything.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TypeContext {
    pub types: FxHashMap<String, TypeDecl>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeDeclKind,
    // Declaration order, most significant field first on the wire
    pub fields: Vec<FieldDecl>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeDeclKind {
    Header,
    Struct,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
}

impl TypeContext {
    pub fn new() -> Self {
        TypeContext {
            types: FxHashMap::default(),
        }
    }

    pub fn add(&mut self, decl: TypeDecl) {
        self.types.insert(decl.name.to_owned(), decl);
    }

    pub fn resolve(&self, name: &str) -> Option<&TypeDecl> {
        self.types.get(name)
    }

    /// Total width in bits of any type reference.
    /// Struct-like types are the sum of their field widths.
    pub fn width_bits(&self, ty: &TypeRef) -> Result<u32, CompileError> {
        match ty {
            TypeRef::Bits { width, .. } => Ok(*width),
            TypeRef::Bool => Ok(1),
            TypeRef::Named(name) => {
                let decl = self.resolve(name).ok_or_else(|| {
                    CompileError::compiler_error(format!(
                        "reference to undeclared type '{}'",
                        name
                    ))
                })?;
                let mut total = 0u32;
                for field in &decl.fields {
                    total += self.width_bits(&field.ty)?;
                }
                Ok(total)
            }
        }
    }

    /// Most-significant-bit position of a field within its declaring type.
    ///
    /// Fields are laid out in declaration order starting at the top of the
    /// type, so the first field's msb is `total_width - 1` and each later
    /// field sits below the widths of everything declared before it.
    pub fn field_msb(&self, type_name: &str, field_name: &str) -> Result<u32, CompileError> {
        let decl = self.resolve(type_name).ok_or_else(|| {
            CompileError::compiler_error(format!("reference to undeclared type '{}'", type_name))
        })?;

        let total = self.width_bits(&TypeRef::Named(type_name.to_owned()))?;
        let mut offset = 0u32;
        for field in &decl.fields {
            if field.name == field_name {
                return Ok(total - offset - 1);
            }
            offset += self.width_bits(&field.ty)?;
        }

        Err(CompileError::compiler_error(format!(
            "type '{}' has no field named '{}'",
            type_name, field_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethernet_context() -> TypeContext {
        let mut ctx = TypeContext::new();
        ctx.add(TypeDecl {
            name: "ethernet_t".to_string(),
            kind: TypeDeclKind::Header,
            fields: vec![
                FieldDecl {
                    name: "dst_addr".to_string(),
                    ty: TypeRef::bit(48),
                },
                FieldDecl {
                    name: "src_addr".to_string(),
                    ty: TypeRef::bit(48),
                },
                FieldDecl {
                    name: "ether_type".to_string(),
                    ty: TypeRef::bit(16),
                },
            ],
        });
        ctx.add(TypeDecl {
            name: "headers_t".to_string(),
            kind: TypeDeclKind::Struct,
            fields: vec![FieldDecl {
                name: "ethernet".to_string(),
                ty: TypeRef::Named("ethernet_t".to_string()),
            }],
        });
        ctx
    }

    #[test]
    fn struct_width_is_sum_of_fields() {
        let ctx = ethernet_context();
        let width = ctx
            .width_bits(&TypeRef::Named("ethernet_t".to_string()))
            .unwrap();
        assert_eq!(width, 112);

        // Nested struct resolves through the header
        let width = ctx
            .width_bits(&TypeRef::Named("headers_t".to_string()))
            .unwrap();
        assert_eq!(width, 112);
    }

    #[test]
    fn field_msb_counts_down_from_the_top() {
        let ctx = ethernet_context();
        assert_eq!(ctx.field_msb("ethernet_t", "dst_addr").unwrap(), 111);
        assert_eq!(ctx.field_msb("ethernet_t", "src_addr").unwrap(), 63);
        assert_eq!(ctx.field_msb("ethernet_t", "ether_type").unwrap(), 15);
    }

    #[test]
    fn unknown_type_and_field_are_reported() {
        let ctx = ethernet_context();
        assert!(ctx.width_bits(&TypeRef::Named("vlan_t".to_string())).is_err());
        assert!(ctx.field_msb("ethernet_t", "vlan_id").is_err());
    }
}
