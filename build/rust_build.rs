/**
 * Generates Rust types for the numbering-plan schema in resources/.
 * The data table itself (resources/PhoneNumberMetadata.textproto) is
 * embedded as text and parsed at runtime.
 */

fn main() {
    println!("cargo:rerun-if-changed=resources/phonemetadata.proto");
    println!("cargo:rerun-if-changed=resources/PhoneNumberMetadata.textproto");

    protobuf_codegen::Codegen::new()
        .pure()
        .includes(["resources"])
        .input("resources/phonemetadata.proto")
        .cargo_out_dir("proto_gen")
        .run_from_script();
}
