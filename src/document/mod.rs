pub mod template;

pub use template::IcfDocument;
