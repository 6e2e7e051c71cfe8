//! Named, lazily-initialized field storage.
//!
//! A [`Datastore`] is a keyed container of field variables. Stores form a
//! tree: lookups that miss in a child walk up through weak parent links,
//! so a mesh-wide root can be shadowed by region-local children. An
//! entry is either a raw typed buffer (one of nine kinds: scalar /
//! vector / ragged of int, double, and [`Vec3`]) or a *computed* field
//! carrying an init function. Computed fields are resolved on first
//! access through [`crate::mesh::Mesh::caccess_dblv`] and friends; an
//! init procedure is free to pull on other fields, which recursively
//! initializes them. A dependency cycle is a definition bug and faults
//! loudly.
//!
//! Nothing here is thread-safe: a datastore belongs to the single
//! cooperative thread of its PE, and views handed out by the typed
//! accessors follow `RefCell` discipline (taking a mutable view while a
//! shared view is live panics).

use crate::mesh::Mesh;
use crate::ragged::Ragged;
use crate::vec3::Vec3;
use anyhow::{bail, Result};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::rc::{Rc, Weak};

/// Initialization progress of a computed entry.
///
/// `InProgress` doubles as the cycle sentinel: observing it during a
/// dependency walk means the definition graph loops back on itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitState {
    NotInitialized,
    InProgress,
    Initialized,
}

/// Type tag for datastore entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Int,
    IntVec,
    IntRag,
    Dbl,
    DblVec,
    DblRag,
    Vec3,
    Vec3Vec,
    Vec3Rag,
}

impl Kind {
    fn empty_value(self) -> Value {
        match self {
            Kind::Int => Value::Int(0),
            Kind::IntVec => Value::IntVec(Vec::new()),
            Kind::IntRag => Value::IntRag(Ragged::default()),
            Kind::Dbl => Value::Dbl(0.0),
            Kind::DblVec => Value::DblVec(Vec::new()),
            Kind::DblRag => Value::DblRag(Ragged::default()),
            Kind::Vec3 => Value::Vec3(Vec3::zero()),
            Kind::Vec3Vec => Value::Vec3Vec(Vec::new()),
            Kind::Vec3Rag => Value::Vec3Rag(Ragged::default()),
        }
    }
}

/// The typed buffer held by an entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    IntVec(Vec<i32>),
    IntRag(Ragged<i32>),
    Dbl(f64),
    DblVec(Vec<f64>),
    DblRag(Ragged<f64>),
    Vec3(Vec3),
    Vec3Vec(Vec<Vec3>),
    Vec3Rag(Ragged<Vec3>),
}

impl Value {
    /// The tag of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Int(_) => Kind::Int,
            Value::IntVec(_) => Kind::IntVec,
            Value::IntRag(_) => Kind::IntRag,
            Value::Dbl(_) => Kind::Dbl,
            Value::DblVec(_) => Kind::DblVec,
            Value::DblRag(_) => Kind::DblRag,
            Value::Vec3(_) => Kind::Vec3,
            Value::Vec3Vec(_) => Kind::Vec3Vec,
            Value::Vec3Rag(_) => Kind::Vec3Rag,
        }
    }
}

/// The init procedure of a computed field.
///
/// Plain function value, not a type hierarchy: the procedure receives the
/// mesh and returns the finished buffer. It may freely call the mesh's
/// typed accessors to pull on other fields.
pub type InitFn = fn(&Mesh) -> Result<Value>;

/// One named field variable.
pub struct Entry {
    kind: Kind,
    init: Option<InitFn>,
    state: Cell<InitState>,
    value: RefCell<Value>,
}

impl Entry {
    /// A raw typed buffer, initially empty.
    pub fn raw(kind: Kind) -> Self {
        Self {
            kind,
            init: None,
            state: Cell::new(InitState::NotInitialized),
            value: RefCell::new(kind.empty_value()),
        }
    }

    /// A raw entry seeded with a value.
    pub fn with_value(value: Value) -> Self {
        let kind = value.kind();
        Self {
            kind,
            init: None,
            state: Cell::new(InitState::NotInitialized),
            value: RefCell::new(value),
        }
    }

    /// A computed field whose buffer is produced by `init` on first access.
    pub fn computed(kind: Kind, init: InitFn) -> Self {
        Self {
            kind,
            init: Some(init),
            state: Cell::new(InitState::NotInitialized),
            value: RefCell::new(kind.empty_value()),
        }
    }

    /// The entry's type tag.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Current initialization state.
    pub fn state(&self) -> InitState {
        self.state.get()
    }

    /// True for computed fields.
    pub fn is_computed(&self) -> bool {
        self.init.is_some()
    }
}

/// Shared view of a typed buffer inside an entry.
///
/// Holds the entry alive for as long as the view exists; dropping the
/// view releases the underlying borrow.
pub struct FieldRef<T: 'static> {
    // Declared before `entry` so the borrow flag clears before the
    // entry handle drops.
    view: Ref<'static, T>,
    #[allow(dead_code)]
    entry: Rc<Entry>,
}

impl<T> Deref for FieldRef<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.view
    }
}

/// Mutable view of a typed buffer inside an entry.
pub struct FieldMut<T: 'static> {
    view: RefMut<'static, T>,
    #[allow(dead_code)]
    entry: Rc<Entry>,
}

impl<T> Deref for FieldMut<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.view
    }
}

impl<T> DerefMut for FieldMut<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.view
    }
}

fn type_mismatch(name: &str, want: &str, got: Kind) -> ! {
    panic!("Datastore: entry {name:?} accessed as {want} but holds {got:?}");
}

macro_rules! field_guards {
    ($( $suffix:ident : $ty:ty => $variant:ident / $label:literal ),* $(,)?) => {
        impl Datastore {
            paste::paste! {$(
                /// Shared typed view of an entry's buffer.
                ///
                /// This is the raw accessor: it does not trigger lazy
                /// initialization (go through the mesh accessors for
                /// that). Panics on a missing name or a type-tag
                /// mismatch, both of which are invariant bugs.
                pub fn [<caccess_ $suffix>](&self, name: &str) -> FieldRef<$ty> {
                    let entry = self.find_or_die(name);
                    let view = Ref::map(entry.value.borrow(), |v| match v {
                        Value::$variant(x) => x,
                        other => type_mismatch(name, $label, other.kind()),
                    });
                    // SAFETY: the view borrows out of the RefCell inside
                    // the Rc'd entry allocation. The guard owns a clone
                    // of that Rc, so the allocation outlives the view,
                    // and the guard's field order drops the view first.
                    let view: Ref<'static, $ty> = unsafe { std::mem::transmute(view) };
                    FieldRef { view, entry }
                }

                /// Mutable typed view of an entry's buffer.
                ///
                /// Raw accessor; see the shared variant for the rules.
                pub fn [<access_ $suffix>](&self, name: &str) -> FieldMut<$ty> {
                    let entry = self.find_or_die(name);
                    let view = RefMut::map(entry.value.borrow_mut(), |v| match v {
                        Value::$variant(x) => x,
                        other => type_mismatch(name, $label, other.kind()),
                    });
                    // SAFETY: as in the shared accessor above.
                    let view: RefMut<'static, $ty> = unsafe { std::mem::transmute(view) };
                    FieldMut { view, entry }
                }
            )*}
        }
    };
}

field_guards! {
    int: i32 => Int / "int",
    intv: Vec<i32> => IntVec / "vector<int>",
    intrr: Ragged<i32> => IntRag / "ragged<int>",
    dbl: f64 => Dbl / "double",
    dblv: Vec<f64> => DblVec / "vector<double>",
    dblrr: Ragged<f64> => DblRag / "ragged<double>",
    vec3: Vec3 => Vec3 / "vec3",
    vec3v: Vec<Vec3> => Vec3Vec / "vector<vec3>",
    vec3rr: Ragged<Vec3> => Vec3Rag / "ragged<vec3>",
}

/// A node in the datastore tree.
pub struct Datastore {
    parent: Weak<Datastore>,
    children: RefCell<Vec<Rc<Datastore>>>,
    entries: RefCell<HashMap<String, Rc<Entry>>>,
}

impl Datastore {
    /// Create a root store.
    pub fn create_root() -> Rc<Datastore> {
        Rc::new(Datastore {
            parent: Weak::new(),
            children: RefCell::new(Vec::new()),
            entries: RefCell::new(HashMap::new()),
        })
    }

    /// Create a child store under `parent`.
    ///
    /// The child holds only a weak link back; if the parent subtree is
    /// dropped while the child is still referenced, lookups short-circuit
    /// to the child alone.
    pub fn create_child(parent: &Rc<Datastore>) -> Rc<Datastore> {
        let child = Rc::new(Datastore {
            parent: Rc::downgrade(parent),
            children: RefCell::new(Vec::new()),
            entries: RefCell::new(HashMap::new()),
        });
        parent.children.borrow_mut().push(Rc::clone(&child));
        child
    }

    /// The store's children.
    pub fn children(&self) -> Vec<Rc<Datastore>> {
        self.children.borrow().clone()
    }

    /// Register `entry` under `name` in this store.
    ///
    /// Fails if the name is already present *in this store*; shadowing a
    /// parent entry is not an error.
    pub fn insert(&self, name: &str, entry: Entry) -> Result<()> {
        let mut entries = self.entries.borrow_mut();
        if entries.contains_key(name) {
            bail!("datastore entry {name:?} is already registered");
        }
        entries.insert(name.to_string(), Rc::new(entry));
        Ok(())
    }

    /// Look up `name` in this store, then up the parent chain.
    pub fn find(&self, name: &str) -> Option<Rc<Entry>> {
        if let Some(e) = self.entries.borrow().get(name) {
            return Some(Rc::clone(e));
        }
        match self.parent.upgrade() {
            Some(p) => p.find(name),
            None => None,
        }
    }

    /// Like [`find`](Self::find), but a miss is fatal.
    pub fn find_or_die(&self, name: &str) -> Rc<Entry> {
        match self.find(name) {
            Some(e) => e,
            None => panic!("Datastore: unable to find variable named {name:?}"),
        }
    }

    /// Run a computed entry's init procedure if it has not run yet.
    ///
    /// Re-entry while the entry is `InProgress` means the init graph has
    /// a cycle, which is fatal. Raw entries are untouched.
    pub fn init_entry(&self, mesh: &Mesh, name: &str) {
        let entry = self.find_or_die(name);
        let Some(init) = entry.init else { return };
        match entry.state.get() {
            InitState::Initialized => {}
            InitState::InProgress => {
                panic!("VAR_{name}::init_(): dependency cycle detected");
            }
            InitState::NotInitialized => {
                entry.state.set(InitState::InProgress);
                tracing::debug!(field = name, "initializing computed field");
                let value = match init(mesh) {
                    Ok(v) => v,
                    Err(e) => panic!("VAR_{name}::init_(): {e:#}"),
                };
                if value.kind() != entry.kind {
                    type_mismatch(name, "its declared kind", value.kind());
                }
                *entry.value.borrow_mut() = value;
                entry.state.set(InitState::Initialized);
            }
        }
    }

    /// Drop a computed value and reset it to `NotInitialized`, so the
    /// next access re-runs its init procedure. No-op for raw entries.
    pub fn release(&self, name: &str) {
        let entry = self.find_or_die(name);
        if entry.init.is_some() {
            *entry.value.borrow_mut() = entry.kind.empty_value();
            entry.state.set(InitState::NotInitialized);
        }
    }
}
