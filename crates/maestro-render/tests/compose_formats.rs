use maestro_render::{
    compose_format, writer_for, OutputFormat, PageGeometry, ProgramInfo, RenderError,
    RenderOptions,
};
use maestro_test_utils::airlock_egress;
use std::io::Read;
use tempfile::TempDir;

fn docx_part(bytes: Vec<u8>, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut content = String::new();
    part.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn every_format_writes_its_destination() {
    let out = TempDir::new().unwrap();
    let procedure = airlock_egress();
    let program = ProgramInfo::default();
    let options = RenderOptions::default();

    for format in OutputFormat::ALL {
        let path = compose_format(format, &procedure, &program, &options, out.path())
            .await
            .unwrap();
        assert!(path.is_file(), "{format} did not write {}", path.display());
    }

    let root = out.path();
    assert!(root.join("airlock-egress.docx").is_file());
    assert!(root.join("airlock-egress.sodf.docx").is_file());
    assert!(root.join("EV1-1234/EV1-1234.xml").is_file());
    assert!(root.join("airlock-egress.eva.html").is_file());
    assert!(root.join("airlock-egress.md").is_file());
    assert!(!root.join("airlock-egress.xml").exists());
}

#[tokio::test]
async fn docx_variants_carry_their_geometry() {
    let out = TempDir::new().unwrap();
    let procedure = airlock_egress();
    let program = ProgramInfo::default();
    let options = RenderOptions::default();

    let eva = compose_format(OutputFormat::EvaDocx, &procedure, &program, &options, out.path())
        .await
        .unwrap();
    let document = docx_part(std::fs::read(eva).unwrap(), "word/document.xml");
    assert!(document.contains(r#"w:w="15840" w:h="12240" w:orient="landscape""#));
    assert!(document.contains(r#"w:val="right" w:pos="14400""#));
    assert!(document.contains(r#"w:top="720""#));
    assert!(document.contains("Airlock Egress - Prep"));
    assert!(document.contains("5 minutes wasted before this activity"));
    assert!(document.contains("IV/SSRMS"));

    let sodf = compose_format(OutputFormat::SodfDocx, &procedure, &program, &options, out.path())
        .await
        .unwrap();
    let document = docx_part(std::fs::read(sodf).unwrap(), "word/document.xml");
    assert!(document.contains(r#"w:orient="portrait""#));
    assert!(document.contains(r#"w:pos="10800""#));
}

#[tokio::test]
async fn geometry_override_is_used() {
    let out = TempDir::new().unwrap();
    let procedure = airlock_egress();
    let program = ProgramInfo::default();
    let mut options = RenderOptions::default();
    options.eva_geometry = PageGeometry {
        right_tab_position: 9999,
        ..PageGeometry::eva()
    };

    let eva = compose_format(OutputFormat::EvaDocx, &procedure, &program, &options, out.path())
        .await
        .unwrap();
    let document = docx_part(std::fs::read(eva).unwrap(), "word/document.xml");
    assert!(document.contains(r#"w:pos="9999""#));
}

#[tokio::test]
async fn xml_without_document_id_fails_only_that_format() {
    let out = TempDir::new().unwrap();
    let mut procedure = airlock_egress();
    procedure.fields.remove("document_id");
    let program = ProgramInfo::default();
    let options = RenderOptions::default();

    let err = compose_format(OutputFormat::IpvXml, &procedure, &program, &options, out.path())
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::MissingField { .. }));
    assert!(!err.is_fatal());

    compose_format(OutputFormat::Html, &procedure, &program, &options, out.path())
        .await
        .unwrap();
}

#[tokio::test]
async fn write_before_tasks_is_incomplete() {
    let procedure = airlock_egress();
    let program = ProgramInfo::default();
    let mut writer = writer_for(OutputFormat::Html, &procedure, &program, &RenderOptions::default());

    writer.render_intro().await.unwrap();
    let partial = String::from_utf8(writer.to_bytes().unwrap()).unwrap();
    assert!(partial.contains("Airlock Egress"));
    assert!(!partial.contains(r#"data-title="Prep""#));

    writer.render_tasks().unwrap();
    let complete = String::from_utf8(writer.to_bytes().unwrap()).unwrap();
    assert!(complete.contains(r#"data-title="Egress""#));
}
