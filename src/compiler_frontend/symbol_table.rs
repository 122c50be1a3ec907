//! Every function and named type a module can see, keyed by name.
//!
//! Built once per module before any body is checked, then shared read-only by every
//! per-function pipeline. Function names may be overloaded on their parameter types.

use crate::compiler_frontend::ast::ast_nodes::{
    FunctionDecl, GenericParam, ImportedFunction, Module, Param, TextLocation, TypeDecl, TypeExpr,
};
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorKind, ErrorMetaDataKey};
use crate::compiler_frontend::datatypes::Type;
use crate::compiler_frontend::type_resolver::{GenericScope, resolve_type};
use crate::symbol_log;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionOrigin {
    // Index into Module::functions
    Local { decl_index: usize },

    // Qualified path of the module the function was imported from
    Imported { module_path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub generics: Vec<GenericParam>,
    pub param_names: Vec<String>,

    // May contain Type::Param for generic functions
    pub params: Vec<Type>,
    pub return_type: Type,
}

impl FunctionSignature {
    pub fn type_params(&self) -> impl Iterator<Item = &str> {
        self.generics.iter().filter_map(|generic| match generic {
            GenericParam::Type(name) => Some(name.as_str()),
            GenericParam::Lifetime(_) => None,
        })
    }

    pub fn is_generic(&self) -> bool {
        self.type_params().next().is_some()
    }
}

#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub id: FunctionId,
    pub name: String,
    pub origin: FunctionOrigin,
    pub signature: FunctionSignature,
    pub is_const: bool,
    pub is_export: bool,
    pub location: TextLocation,
}

#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub location: TextLocation,
}

pub type NamedTypes = FxHashMap<String, TypeSymbol>;

#[derive(Debug, Default)]
pub struct SymbolTable {
    functions: Vec<FunctionSymbol>,
    by_name: FxHashMap<String, Vec<FunctionId>>,
    types: NamedTypes,
}

impl SymbolTable {
    /// Registers named types, then imported functions, then local functions.
    /// Every problem found is returned, in declaration order.
    pub fn build(module: &Module) -> Result<SymbolTable, Vec<CompilerError>> {
        let mut table = SymbolTable::default();
        let mut errors = Vec::new();

        for decl in &module.types {
            if let Err(e) = table.register_type(decl) {
                errors.push(e);
            }
        }

        for import in &module.imports {
            if let Err(e) = table.register_import(import) {
                errors.push(e);
            }
        }

        for (decl_index, decl) in module.functions.iter().enumerate() {
            if let Err(e) = table.register_local(decl_index, decl) {
                errors.push(e);
            }
        }

        if let Err(e) = table.check_exports() {
            errors.push(e);
        }

        if errors.is_empty() {
            symbol_log!(Green "Symbol table built with ", table.functions.len(), " functions");
            Ok(table)
        } else {
            Err(errors)
        }
    }

    pub fn function(&self, id: FunctionId) -> &FunctionSymbol {
        &self.functions[id.0 as usize]
    }

    pub fn functions(&self) -> &[FunctionSymbol] {
        &self.functions
    }

    pub fn overloads(&self, name: &str) -> &[FunctionId] {
        match self.by_name.get(name) {
            Some(ids) => ids,
            None => &[],
        }
    }

    pub fn named_types(&self) -> &NamedTypes {
        &self.types
    }

    pub fn resolve_type(
        &self,
        ty: &TypeExpr,
        scope: &GenericScope,
        location: &TextLocation,
    ) -> Result<Type, CompilerError> {
        resolve_type(ty, scope, &self.types, location)
    }

    fn register_type(&mut self, decl: &TypeDecl) -> Result<(), CompilerError> {
        if self.types.contains_key(&decl.name) {
            return Err(duplicate_definition(&decl.name, &decl.location));
        }

        // Validates the generic list itself
        GenericScope::from_params(&decl.generics, &decl.location)?;

        symbol_log!("Registered type ", Blue decl.name);
        self.types.insert(
            decl.name.to_owned(),
            TypeSymbol {
                name: decl.name.to_owned(),
                generics: decl.generics.to_owned(),
                location: decl.location.to_owned(),
            },
        );

        Ok(())
    }

    fn register_import(&mut self, import: &ImportedFunction) -> Result<(), CompilerError> {
        let signature = self.resolve_signature(
            &import.generics,
            &import.params,
            import.return_type.as_ref(),
            &import.location,
        )?;

        // A host function has one concrete WASM signature
        if signature.is_generic() {
            return Err(CompilerError::new(
                ErrorKind::InvalidImport {
                    name: import.name.to_owned(),
                },
                format!(
                    "Imported function '{}' from '{}' can't have generic type parameters",
                    import.name, import.module_path
                ),
                import.location.to_owned(),
            ));
        }

        self.insert_function(
            &import.name,
            FunctionOrigin::Imported {
                module_path: import.module_path.to_owned(),
            },
            signature,
            import.is_const,
            false,
            &import.location,
        )
    }

    fn register_local(&mut self, decl_index: usize, decl: &FunctionDecl) -> Result<(), CompilerError> {
        let signature = self.resolve_signature(
            &decl.generics,
            &decl.params,
            decl.return_type.as_ref(),
            &decl.location,
        )?;

        // Each exported function needs one concrete WASM function to point at
        if decl.is_export && signature.is_generic() {
            return Err(CompilerError::new(
                ErrorKind::InvalidExport {
                    name: decl.name.to_owned(),
                },
                format!(
                    "Generic function '{}' can't be exported, it has no single WASM signature",
                    decl.name
                ),
                decl.location.to_owned(),
            ));
        }

        self.insert_function(
            &decl.name,
            FunctionOrigin::Local { decl_index },
            signature,
            decl.is_const,
            decl.is_export,
            &decl.location,
        )
    }

    fn resolve_signature(
        &self,
        generics: &[GenericParam],
        params: &[Param],
        return_type: Option<&TypeExpr>,
        location: &TextLocation,
    ) -> Result<FunctionSignature, CompilerError> {
        let scope = GenericScope::from_params(generics, location)?;

        let mut param_types = Vec::with_capacity(params.len());
        let mut param_names: Vec<String> = Vec::with_capacity(params.len());
        for param in params {
            if param_names.contains(&param.name) {
                return Err(duplicate_definition(&param.name, &param.location));
            }
            param_types.push(self.resolve_type(&param.ty, &scope, &param.location)?);
            param_names.push(param.name.to_owned());
        }

        let return_type = match return_type {
            Some(ty) => self.resolve_type(ty, &scope, location)?,
            None => Type::unit(),
        };

        Ok(FunctionSignature {
            generics: generics.to_owned(),
            param_names,
            params: param_types,
            return_type,
        })
    }

    fn insert_function(
        &mut self,
        name: &str,
        origin: FunctionOrigin,
        signature: FunctionSignature,
        is_const: bool,
        is_export: bool,
        location: &TextLocation,
    ) -> Result<(), CompilerError> {
        // Overloads must differ in their parameter types
        for existing in self.overloads(name) {
            let existing = &self.functions[existing.0 as usize].signature.params;
            let same_params = existing.len() == signature.params.len()
                && existing
                    .iter()
                    .zip(&signature.params)
                    .all(|(a, b)| a.same_ignoring_lifetimes(b));

            if same_params {
                return Err(duplicate_definition(name, location));
            }
        }

        let id = FunctionId(self.functions.len() as u32);
        symbol_log!("Registered function ", Blue name, " as ", Bright id.0);

        self.functions.push(FunctionSymbol {
            id,
            name: name.to_owned(),
            origin,
            signature,
            is_const,
            is_export,
            location: location.to_owned(),
        });
        self.by_name.entry(name.to_owned()).or_default().push(id);

        Ok(())
    }

    // WASM export names must be unique, so an exported name can't be overloaded
    fn check_exports(&self) -> Result<(), CompilerError> {
        let mut seen: FxHashMap<&str, FunctionId> = FxHashMap::default();
        for function in self.functions.iter().filter(|function| function.is_export) {
            if seen.insert(&function.name, function.id).is_some() {
                return Err(CompilerError::new(
                    ErrorKind::InvalidExport {
                        name: function.name.to_owned(),
                    },
                    format!(
                        "Only one overload of '{}' can be exported",
                        function.name
                    ),
                    function.location.to_owned(),
                ));
            }
        }

        Ok(())
    }
}

fn duplicate_definition(name: &str, location: &TextLocation) -> CompilerError {
    CompilerError::new(
        ErrorKind::DuplicateDefinition {
            name: name.to_owned(),
        },
        format!("'{name}' is defined more than once"),
        location.to_owned(),
    )
    .with_metadata(ErrorMetaDataKey::VariableName, name)
}

#[cfg(test)]
#[path = "tests/symbol_table_tests.rs"]
mod tests;
