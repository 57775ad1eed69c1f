//! The information object system: object classes, objects, object sets and
//! the storage that holds them.  Nodes refer to each other by id, all of them
//! live in a [`Store`].

mod chain;
mod class;
mod field;
mod object;
mod object_parser;
mod object_set;
mod store;
mod sub_parser;
mod syntax;
mod types;

pub use self::{
    chain::ReferenceChain,
    class::{ClassDefinition, ClassReference, ObjectClass},
    field::{FieldKind, FieldSpecification, FieldSpecifications, SettingKind},
    object::{FieldSetting, Object, ObjectDefinition, ObjectReference, Setting},
    object_parser::{ObjectSyntaxParser, ParsedObject},
    object_set::{ObjectSet, ObjectSetDefinition, ObjectSetElement, ObjectSetReference},
    store::{
        Assignment, AssignmentKind, Module, ModuleId, NodeId, NodeSink, ObjectClassId, ObjectId,
        ObjectSetId, Store,
    },
    sub_parser::{Parsed, SubParser},
    syntax::{check_template, expand_version_brackets, SyntaxNode, SyntaxRoot, SyntaxSequence},
    types::{BuiltinType, ConstructedKind, Identifier, Reference, Type, TypeKind, Value},
};
