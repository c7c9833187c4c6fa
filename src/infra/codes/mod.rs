pub mod fs_code_store;
