use super::*;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Output {
  pub url: String,
}

#[derive(Debug, Parser)]
#[clap(group(
  ArgGroup::new("content")
    .required(true)
    .args(&["file", "text"]),
))]
pub(crate) struct Upload {
  #[arg(help = "Upload <FILE>.")]
  file: Option<PathBuf>,
  #[arg(long, help = "Upload <TEXT> as a plain text file.")]
  text: Option<String>,
  #[command(flatten)]
  parameters: ParameterSource,
}

impl Upload {
  pub(crate) fn run(self, options: Options) -> SubcommandResult {
    let config = options.load_config()?;
    let chain = options.chain(&config);
    let parameters = self.parameters.resolve(chain, &config)?;
    let uploader = Uploader::new(options.upload_url(&config)?);

    let upload = Self::content(self.file, self.text)?;

    let url = runtime()?.block_on(uploader.upload(upload, parameters.max_size))?;

    Ok(Box::new(Output { url }))
  }

  fn content(file: Option<PathBuf>, text: Option<String>) -> Result<service::Upload> {
    match (file, text) {
      (Some(path), _) => Ok(service::Upload::File {
        name: path
          .file_name()
          .map(|name| name.to_string_lossy().into_owned())
          .ok_or_else(|| anyhow!("{} is not a file", path.display()))?,
        data: fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?,
      }),
      (None, Some(text)) => Ok(service::Upload::Text(text)),
      (None, None) => bail!("nothing to upload: pass <FILE> or --text"),
    }
  }
}
