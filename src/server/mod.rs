use std::{future::Future, sync::Arc};

mod emulator;
pub mod tcp;

pub use self::emulator::{Emulator, UniformWords, WordSource, ALL_POINTS_ON};

/// Per-connection request handler.
///
/// The session loop is generic over this so tests can swap the emulator
/// for canned or faulting services.
pub trait Service {
    type Request;
    type Response;
    type Exception;
    type Future: Future<Output = Result<Self::Response, Self::Exception>> + Send;

    fn call(&self, req: Self::Request) -> Self::Future;
}

impl<T> Service for Arc<T>
where
    T: Service,
{
    type Request = T::Request;
    type Response = T::Response;
    type Exception = T::Exception;
    type Future = T::Future;

    fn call(&self, req: Self::Request) -> Self::Future {
        (**self).call(req)
    }
}
