use geom_kernel::{Kernel, KernelIntrospect};

/// Mutable kernel access plus read-only topology queries on the same object.
///
/// Feature steps need both in one call chain (select edges, then fillet them); a single
/// trait object avoids holding `&mut` and `&` borrows of the kernel at once.
pub trait KernelBundle: Kernel + KernelIntrospect {
    fn as_introspect(&self) -> &dyn KernelIntrospect;
    fn as_kernel_mut(&mut self) -> &mut dyn Kernel;
}

impl<T: Kernel + KernelIntrospect> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }

    fn as_kernel_mut(&mut self) -> &mut dyn Kernel {
        self
    }
}
