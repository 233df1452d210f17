// Test directory conversion of BCMH chorales to RomanText

use std::fs;
use std::path::Path;

use bcmh_rntxt::{BatchConverter, ConversionError, ConverterConfig};
use tempfile::TempDir;

/// Four-voice chorale fragment with a pickup, a Dorian key and an inline key change
const DORIAN_CHORALE: &str = "\
!!!COM: Bach, Johann Sebastian
!!!OTL: Christ lag in Todesbanden
**harm\t**kern\t**kern\t**kern\t**kern
*\t*M4/4\t*M4/4\t*M4/4\t*M4/4
*\t*d:dor\t*d:dor\t*d:dor\t*d:dor
i\t4D\t4A\t4f\t4dd
=1\t=1\t=1\t=1\t=1
F:V\t4C\t4G\t4e\t4cc
I\t4F\t4A\t4f\t4cc
V7%\t4C\t4G\t4e\t4b-
I;\t4F\t4A\t4f\t4a
==\t==\t==\t==\t==
*-\t*-\t*-\t*-\t*-
";

const MAJOR_CHORALE: &str = "\
!!!COM: Bach, Johann Sebastian
!!!OTL: Nun danket alle Gott
**harm\t**kern\t**kern
*\t*M3/4\t*M3/4
*\t*E-:\t*E-:
=1-\t=1-\t=1-
I\t4E-\t4g
V(64)\t4B-\t[4.g
V(54)\t8B-\t.
.\t8A-\t8f]
=2\t=2\t=2
I\t2.E-\t2.g
==\t==\t==
*-\t*-\t*-
";

fn write_input(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).expect("fixture should be writable");
}

fn config_for(input: &TempDir, output: &Path) -> ConverterConfig {
    ConverterConfig {
        input_dir: input.path().to_path_buf(),
        output_dir: output.to_path_buf(),
        ..ConverterConfig::default()
    }
}

#[test]
fn test_batch_writes_one_file_per_input_in_name_order() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let output_dir = output.path().join("rntxt");
    write_input(input.path(), "chor002.krn", MAJOR_CHORALE);
    write_input(input.path(), "chor001.krn", DORIAN_CHORALE);

    let written = BatchConverter::new(config_for(&input, &output_dir)).run().unwrap();

    assert_eq!(
        written,
        vec![output_dir.join("chor001.rntxt"), output_dir.join("chor002.rntxt")]
    );
    assert!(output_dir.is_dir(), "output directory should be created");
}

#[test]
fn test_dorian_pickup_and_inline_key_change() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_input(input.path(), "chor001.krn", DORIAN_CHORALE);

    BatchConverter::new(config_for(&input, output.path())).run().unwrap();
    let rntxt = fs::read_to_string(output.path().join("chor001.rntxt")).unwrap();

    assert!(rntxt.starts_with("Composer: Bach, Johann Sebastian\nTitle: Christ lag in Todesbanden\n"));
    assert!(
        rntxt.ends_with("\nTime Signature: 4/4\n\nm0 b4 d: i\nm1 F: V b2 I b3 V7ø b4 I\n"),
        "unexpected body:\n{}",
        rntxt
    );
}

#[test]
fn test_cadential_six_four_and_suspension() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_input(input.path(), "chor002.krn", MAJOR_CHORALE);

    BatchConverter::new(config_for(&input, output.path())).run().unwrap();
    let rntxt = fs::read_to_string(output.path().join("chor002.rntxt")).unwrap();

    assert!(
        rntxt.ends_with("\nTime Signature: 3/4\n\nm1 Eb: I b2 Cad64 b3 V\nm2 I\n"),
        "unexpected body:\n{}",
        rntxt
    );
}

#[test]
fn test_failure_stops_batch_and_keeps_earlier_output() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_input(input.path(), "chor001.krn", DORIAN_CHORALE);
    write_input(input.path(), "chor002.krn", "**kern\t**kern\n4c\n");
    write_input(input.path(), "chor003.krn", MAJOR_CHORALE);

    let err = BatchConverter::new(config_for(&input, output.path())).run().unwrap_err();

    assert!(matches!(err, ConversionError::Parse(_)));
    assert!(output.path().join("chor001.rntxt").exists());
    assert!(!output.path().join("chor002.rntxt").exists());
    assert!(!output.path().join("chor003.rntxt").exists());
}

#[test]
fn test_missing_input_directory() {
    let output = TempDir::new().unwrap();
    let config = ConverterConfig {
        input_dir: output.path().join("does-not-exist"),
        output_dir: output.path().join("rntxt"),
        ..ConverterConfig::default()
    };

    let err = BatchConverter::new(config).run().unwrap_err();
    assert!(matches!(err, ConversionError::Io { .. }));
}

#[test]
fn test_config_file_drives_batch() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_input(input.path(), "chor002.krn", MAJOR_CHORALE);
    let config_path = output.path().join("bcmh.yaml");
    fs::write(
        &config_path,
        format!(
            "input_dir: {}\noutput_dir: {}\noutput_extension: txt\nproofreader: Nobody\n",
            input.path().display(),
            output.path().join("out").display()
        ),
    )
    .unwrap();

    let config = ConverterConfig::from_yaml_file(&config_path).unwrap();
    let written = BatchConverter::new(config).run().unwrap();

    assert_eq!(written, vec![output.path().join("out").join("chor002.txt")]);
    let rntxt = fs::read_to_string(&written[0]).unwrap();
    assert!(rntxt.contains("\nProofreader: Nobody\n"));
}
