use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InitErrorKind {
    NoGpuAgent,
    NoKernargRegion,
    QueueCreateFailed,
    SignalCreateFailed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadErrorKind {
    FileNotFound,
    NoSystemRegion,
    StagingFailed,
    DeserializeFailed,
    LoadFailed,
    FreezeFailed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResolveErrorKind {
    NotFrozen,
    SymbolNotFound,
    InfoNotFound,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AllocErrorKind {
    NoRegion,
    Inaccessible,
    Exhausted,
    KernargUndersized,
}

macro_rules! error_struct {
    ($ty:ident: $kind:ident) => {
        #[derive(Clone, Debug)]
        pub struct $ty {
            pub kind: $kind,
            pub info: String,
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{:?}: {}", self.kind, self.info)
            }
        }

        impl std::error::Error for $ty {}
    };
}

error_struct!(InitError: InitErrorKind);
error_struct!(LoadError: LoadErrorKind);
error_struct!(ResolveError: ResolveErrorKind);
error_struct!(AllocError: AllocErrorKind);

pub use functions::*;

pub(super) mod functions {
    use super::*;

    macro_rules! builder {
        ($ty:ident: $name:ident $kind:expr) => {
            #[inline]
            pub fn $name(info: impl Into<String>) -> $ty {
                $ty {
                    kind: $kind,
                    info: info.into(),
                }
            }
        };
    }

    builder!(InitError: no_gpu_agent         InitErrorKind::NoGpuAgent        );
    builder!(InitError: no_kernarg_region    InitErrorKind::NoKernargRegion   );
    builder!(InitError: queue_create_failed  InitErrorKind::QueueCreateFailed );
    builder!(InitError: signal_create_failed InitErrorKind::SignalCreateFailed);

    builder!(LoadError: file_not_found       LoadErrorKind::FileNotFound      );
    builder!(LoadError: no_system_region     LoadErrorKind::NoSystemRegion    );
    builder!(LoadError: staging_failed       LoadErrorKind::StagingFailed     );
    builder!(LoadError: deserialize_failed   LoadErrorKind::DeserializeFailed );
    builder!(LoadError: load_failed          LoadErrorKind::LoadFailed        );
    builder!(LoadError: freeze_failed        LoadErrorKind::FreezeFailed      );

    builder!(ResolveError: not_frozen        ResolveErrorKind::NotFrozen      );
    builder!(ResolveError: symbol_not_found  ResolveErrorKind::SymbolNotFound );
    builder!(ResolveError: info_not_found    ResolveErrorKind::InfoNotFound   );

    builder!(AllocError: no_region           AllocErrorKind::NoRegion         );
    builder!(AllocError: inaccessible        AllocErrorKind::Inaccessible     );
    builder!(AllocError: exhausted           AllocErrorKind::Exhausted        );
    builder!(AllocError: kernarg_undersized  AllocErrorKind::KernargUndersized);
}
