pub mod evm_stream;
